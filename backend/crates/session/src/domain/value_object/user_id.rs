use kernel::id::Id;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserMarker;
pub type UserId = Id<UserMarker>;
