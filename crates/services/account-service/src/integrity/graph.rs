//! Declared foreign-key relations between account tables.

use std::fmt;

/// Tables that take part in account deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    Messages,
    Notifications,
    PetProfiles,
    PetWalks,
    ServiceRequests,
    UserFavorites,
    UserComments,
    ServiceProviders,
    UserRequests,
}

impl Table {
    pub const fn name(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Messages => "messages",
            Table::Notifications => "notifications",
            Table::PetProfiles => "pet_profiles",
            Table::PetWalks => "pet_walks",
            Table::ServiceRequests => "service_requests",
            Table::UserFavorites => "user_favorites",
            Table::UserComments => "user_comments",
            Table::ServiceProviders => "service_providers",
            Table::UserRequests => "user_requests",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the store does to a child row when its parent is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    /// Child rows are removed by the store
    Cascade,
    /// The parent delete fails while child rows exist
    Restrict,
    /// The reference is cleared by the store
    SetNull,
}

/// `child.column` references `parent.id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub child: Table,
    pub column: &'static str,
    pub parent: Table,
    pub on_delete: OnDelete,
}

const fn edge(child: Table, column: &'static str, parent: Table, on_delete: OnDelete) -> Edge {
    Edge {
        child,
        column,
        parent,
        on_delete,
    }
}

/// Every foreign key that points (directly or transitively) at `users`.
///
/// Must match the `on_delete` actions in the migrations. Edge order is the
/// order dependents are cleared in.
pub const DEPENDENCY_GRAPH: &[Edge] = &[
    edge(Table::Messages, "sender_id", Table::Users, OnDelete::Restrict),
    edge(Table::Messages, "receiver_id", Table::Users, OnDelete::Restrict),
    edge(Table::Notifications, "related_user_id", Table::Users, OnDelete::Restrict),
    edge(Table::Notifications, "user_id", Table::Users, OnDelete::Cascade),
    edge(Table::PetProfiles, "user_id", Table::Users, OnDelete::Cascade),
    edge(Table::ServiceRequests, "pet_profile_id", Table::PetProfiles, OnDelete::Restrict),
    edge(Table::PetWalks, "user_id", Table::Users, OnDelete::Cascade),
    edge(Table::UserFavorites, "user_id", Table::Users, OnDelete::Cascade),
    edge(Table::UserFavorites, "target_user_id", Table::Users, OnDelete::SetNull),
    edge(Table::UserComments, "user_id", Table::Users, OnDelete::Cascade),
    edge(Table::ServiceProviders, "user_id", Table::Users, OnDelete::Cascade),
    edge(Table::UserRequests, "user_id", Table::Users, OnDelete::Cascade),
    edge(Table::Messages, "job_id", Table::UserRequests, OnDelete::Restrict),
    edge(Table::Notifications, "related_job_id", Table::UserRequests, OnDelete::SetNull),
];

/// Edges whose parent is `parent`, in declaration order.
pub fn edges_into(graph: &[Edge], parent: Table) -> impl Iterator<Item = &Edge> {
    graph.iter().filter(move |e| e.parent == parent)
}
