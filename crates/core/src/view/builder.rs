//! Declarative join/compute builder.
//!
//! A [`ViewBuilder`] assembles the stages that turn matched source documents
//! into enriched views: owner lookups, edge counts, viewer flags and nested
//! joins. The whole plan runs as one `aggregate` call, however many joins it
//! holds.

use serde_json::Value;
use vidtube_db::entities::{Entity, Like, Subscription, User, like, subscription, user};
use vidtube_db::{Expr, Filter, Lookup, SortKey, Stage, document};

/// Builder over the stage algebra.
#[derive(Debug, Clone, Default)]
pub struct ViewBuilder {
    stages: Vec<Stage>,
    scratch: Vec<String>,
}

impl ViewBuilder {
    /// Start an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only documents matching `filter`.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.stages.push(Stage::Match(filter));
        self
    }

    /// Join the user referenced by `local_field` into `as_field`, reduced to
    /// its public fields.
    ///
    /// The join result is collapsed to its first match; a dangling reference
    /// yields `null`, never an error.
    #[must_use]
    pub fn owner(self, local_field: &str, as_field: &str) -> Self {
        self.join_one(
            as_field,
            User::COLLECTION,
            local_field,
            document::ID,
            Self::new().project(user::PUBLIC_FIELDS),
        )
    }

    /// Join a single related document and collapse it to one optional value.
    #[must_use]
    pub fn join_one(
        mut self,
        as_field: &str,
        from: &str,
        local_field: &str,
        foreign_field: &str,
        nested: Self,
    ) -> Self {
        self.stages.push(lookup(as_field, from, local_field, foreign_field, nested));
        self.stages.push(Stage::Set(vec![(
            as_field.to_string(),
            Expr::First(as_field.to_string()),
        )]));
        self
    }

    /// Join every related document into an array field.
    #[must_use]
    pub fn join_many(
        mut self,
        as_field: &str,
        from: &str,
        local_field: &str,
        foreign_field: &str,
        nested: Self,
    ) -> Self {
        self.stages.push(lookup(as_field, from, local_field, foreign_field, nested));
        self
    }

    /// Derive counts and viewer flags from an edge collection.
    #[must_use]
    pub fn edges(mut self, edges: EdgeView) -> Self {
        let scratch = format!("_edges{}", self.scratch.len());
        let actor_path = format!("{scratch}.{}", edges.actor_field);

        self.stages.push(Stage::Lookup(Lookup {
            from: edges.from.to_string(),
            local_field: edges.local_field.clone(),
            foreign_field: edges.target_field.to_string(),
            as_field: scratch.clone(),
            pipeline: vec![Stage::Project(vec![edges.actor_field.to_string()])],
        }));

        let mut computed = Vec::new();
        if let Some(name) = edges.count_as {
            computed.push((name, Expr::Size(scratch.clone())));
        }
        if let Some((name, viewer)) = edges.flag_as {
            let expr = match viewer {
                Some(viewer) => Expr::Contains {
                    path: actor_path,
                    value: Value::String(viewer),
                },
                None => Expr::Literal(Value::Bool(false)),
            };
            computed.push((name, expr));
        }
        if !computed.is_empty() {
            self.stages.push(Stage::Set(computed));
        }

        self.scratch.push(scratch);
        self
    }

    /// Compute a field from an expression.
    #[must_use]
    pub fn compute(mut self, as_field: &str, expr: Expr) -> Self {
        self.stages.push(Stage::Set(vec![(as_field.to_string(), expr)]));
        self
    }

    /// Keep only the listed fields (plus the id).
    #[must_use]
    pub fn project(mut self, fields: &[&str]) -> Self {
        self.stages.push(Stage::Project(
            fields.iter().map(ToString::to_string).collect(),
        ));
        self
    }

    /// Drop the listed fields.
    #[must_use]
    pub fn hide(mut self, fields: &[&str]) -> Self {
        self.stages
            .push(Stage::Unset(fields.iter().map(ToString::to_string).collect()));
        self
    }

    /// Sort, used inside nested joins.
    #[must_use]
    pub fn sort(mut self, keys: Vec<SortKey>) -> Self {
        self.stages.push(Stage::Sort(keys));
        self
    }

    /// Limit, used inside nested joins.
    #[must_use]
    pub fn limit(mut self, n: u64) -> Self {
        self.stages.push(Stage::Limit(n));
        self
    }

    /// Finish the plan, removing scratch fields.
    #[must_use]
    pub fn build(mut self) -> Vec<Stage> {
        if !self.scratch.is_empty() {
            self.stages.push(Stage::Unset(std::mem::take(&mut self.scratch)));
        }
        self.stages
    }
}

fn lookup(as_field: &str, from: &str, local_field: &str, foreign_field: &str, nested: ViewBuilder) -> Stage {
    Stage::Lookup(Lookup {
        from: from.to_string(),
        local_field: local_field.to_string(),
        foreign_field: foreign_field.to_string(),
        as_field: as_field.to_string(),
        pipeline: nested.build(),
    })
}

/// Counts and viewer flags derived from one edge collection.
///
/// Edges are matched on `target_field == doc[local_field]`; the viewer flag
/// tests whether one of those edges has `actor_field == viewer`.
#[derive(Debug, Clone)]
pub struct EdgeView {
    from: &'static str,
    target_field: &'static str,
    actor_field: &'static str,
    local_field: String,
    count_as: Option<String>,
    flag_as: Option<(String, Option<String>)>,
}

impl EdgeView {
    /// Likes whose `target_field` (video, comment or tweet) points at this document.
    #[must_use]
    pub fn likes(target_field: &'static str) -> Self {
        Self {
            from: Like::COLLECTION,
            target_field,
            actor_field: like::field::LIKED_BY,
            local_field: document::ID.to_string(),
            count_as: None,
            flag_as: None,
        }
    }

    /// Subscriptions to the channel identified by this document.
    #[must_use]
    pub fn subscribers() -> Self {
        Self {
            from: Subscription::COLLECTION,
            target_field: subscription::field::CHANNEL,
            actor_field: subscription::field::SUBSCRIBER,
            local_field: document::ID.to_string(),
            count_as: None,
            flag_as: None,
        }
    }

    /// Subscriptions made by the user identified by this document.
    #[must_use]
    pub fn subscribed_to() -> Self {
        Self {
            from: Subscription::COLLECTION,
            target_field: subscription::field::SUBSCRIBER,
            actor_field: subscription::field::CHANNEL,
            local_field: document::ID.to_string(),
            count_as: None,
            flag_as: None,
        }
    }

    /// Identify the target through `field` instead of the document id.
    #[must_use]
    pub fn on(mut self, field: &str) -> Self {
        self.local_field = field.to_string();
        self
    }

    /// Store the number of edges in `name`.
    #[must_use]
    pub fn count_as(mut self, name: &str) -> Self {
        self.count_as = Some(name.to_string());
        self
    }

    /// Store in `name` whether `viewer` holds one of the edges.
    ///
    /// Anonymous viewers always get `false`.
    #[must_use]
    pub fn flag_as(mut self, name: &str, viewer: Option<&str>) -> Self {
        self.flag_as = Some((name.to_string(), viewer.map(ToString::to_string)));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_join_collapses() {
        let stages = ViewBuilder::new().owner("owner", "ownerDetails").build();
        assert_eq!(stages.len(), 2);
        match (&stages[0], &stages[1]) {
            (Stage::Lookup(lookup), Stage::Set(fields)) => {
                assert_eq!(lookup.from, "users");
                assert_eq!(lookup.local_field, "owner");
                assert!(matches!(&lookup.pipeline[0], Stage::Project(f) if !f.iter().any(|x| x == "password")));
                assert!(matches!(&fields[0].1, Expr::First(f) if f == "ownerDetails"));
            }
            other => panic!("unexpected stages {other:?}"),
        }
    }

    #[test]
    fn test_edges_scratch_is_removed() {
        let stages = ViewBuilder::new()
            .edges(EdgeView::likes("video").count_as("likesCount").flag_as("isLiked", None))
            .edges(EdgeView::subscribers().on("owner").count_as("subs"))
            .build();

        match stages.last() {
            Some(Stage::Unset(fields)) => assert_eq!(fields, &["_edges0", "_edges1"]),
            other => panic!("expected trailing unset, got {other:?}"),
        }
    }

    #[test]
    fn test_anonymous_flag_is_literal_false() {
        let stages = ViewBuilder::new()
            .edges(EdgeView::likes("tweet").flag_as("isLiked", None))
            .build();
        let flag = stages.iter().find_map(|s| match s {
            Stage::Set(fields) => fields.iter().find(|(n, _)| n == "isLiked").map(|(_, e)| e.clone()),
            _ => None,
        });
        assert!(matches!(flag, Some(Expr::Literal(Value::Bool(false)))));
    }
}
