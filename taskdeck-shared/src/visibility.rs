/// Caller identity and task visibility rules
///
/// Every request resolves to a [`Caller`]: either an authenticated user or
/// anonymous. A task is visible to a caller when it has no owner (a public
/// task) or when the caller is its owner. That single predicate gates every
/// task read and write; a task outside it behaves as if it does not exist.
///
/// # SQL form
///
/// All task queries embed the predicate as
///
/// ```sql
/// (created_by IS NULL OR created_by = $n)
/// ```
///
/// binding [`Caller::owner_id`]. For anonymous callers the bind is NULL,
/// which makes the equality arm vacuous and leaves only the public tasks.
///
/// # Example
///
/// ```
/// use taskdeck_shared::visibility::Caller;
/// use uuid::Uuid;
///
/// let me = Uuid::new_v4();
/// let caller = Caller::User(me);
///
/// assert!(caller.can_view(None));
/// assert!(caller.can_view(Some(me)));
/// assert!(!caller.can_view(Some(Uuid::new_v4())));
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The identity a request is acting as
///
/// Inserted into request extensions by the auth middleware and consumed by
/// handlers and model queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Caller {
    /// No credentials were presented
    Anonymous,

    /// A valid token resolved to this user
    User(Uuid),
}

impl Caller {
    /// Whether the caller presented valid credentials
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Caller::User(_))
    }

    /// The user id to record as a task owner, or bind into the visibility
    /// predicate
    ///
    /// `None` for anonymous callers, which both stores NULL ownership on
    /// create and restricts queries to public tasks.
    pub fn owner_id(&self) -> Option<Uuid> {
        match self {
            Caller::Anonymous => None,
            Caller::User(id) => Some(*id),
        }
    }

    /// The visibility predicate as a pure function
    ///
    /// True when the task is public (no owner) or owned by this caller.
    pub fn can_view(&self, owner: Option<Uuid>) -> bool {
        match owner {
            None => true,
            Some(owner_id) => self.owner_id() == Some(owner_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_sees_only_public_tasks() {
        let caller = Caller::Anonymous;

        assert!(caller.can_view(None));
        assert!(!caller.can_view(Some(Uuid::new_v4())));
    }

    #[test]
    fn test_user_sees_public_and_own_tasks() {
        let me = Uuid::new_v4();
        let caller = Caller::User(me);

        assert!(caller.can_view(None));
        assert!(caller.can_view(Some(me)));
        assert!(!caller.can_view(Some(Uuid::new_v4())));
    }

    #[test]
    fn test_owner_id() {
        let me = Uuid::new_v4();

        assert_eq!(Caller::Anonymous.owner_id(), None);
        assert_eq!(Caller::User(me).owner_id(), Some(me));
    }

    #[test]
    fn test_is_authenticated() {
        assert!(!Caller::Anonymous.is_authenticated());
        assert!(Caller::User(Uuid::new_v4()).is_authenticated());
    }
}
