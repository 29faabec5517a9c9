use serde::{Deserialize, Serialize};

/// Capability tier of a user.
///
/// Canonical numeric codes as stored in `users.role_id`: admin = 1,
/// moderator = 2, reader = 3. Unknown codes are treated as plain readers so a
/// bad row can never grant privileges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Moderator,
    Reader,
}

impl Role {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Role::Admin,
            2 => Role::Moderator,
            _ => Role::Reader,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Role::Admin => 1,
            Role::Moderator => 2,
            Role::Reader => 3,
        }
    }
}

/// Privileged operations gated by a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateBook,
    EditBook,
    DeleteBook,
    EditReview,
}

/// Table mapping each privileged action to the roles allowed to perform it.
///
/// Kept as data rather than per-route role checks so the one deliberate
/// asymmetry (moderators may edit books but not create or delete them) lives
/// in exactly one place.
#[derive(Debug, Clone)]
pub struct Policy {
    pub create_book: &'static [Role],
    pub edit_book: &'static [Role],
    pub delete_book: &'static [Role],
    pub edit_review: &'static [Role],
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            create_book: &[Role::Admin],
            edit_book: &[Role::Admin, Role::Moderator],
            delete_book: &[Role::Admin],
            edit_review: &[Role::Admin, Role::Moderator],
        }
    }
}

impl Policy {
    pub fn allows(&self, role: Role, action: Action) -> bool {
        let allowed = match action {
            Action::CreateBook => self.create_book,
            Action::EditBook => self.edit_book,
            Action::DeleteBook => self.delete_book,
            Action::EditReview => self.edit_review,
        };
        allowed.contains(&role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_codes_round_trip() {
        for role in [Role::Admin, Role::Moderator, Role::Reader] {
            assert_eq!(Role::from_code(role.code()), role);
        }
        // Unknown codes degrade to reader, never to a privileged tier
        assert_eq!(Role::from_code(0), Role::Reader);
        assert_eq!(Role::from_code(42), Role::Reader);
    }

    #[test]
    fn default_policy_restricts_create_and_delete_to_admin() {
        let policy = Policy::default();
        for action in [Action::CreateBook, Action::DeleteBook] {
            assert!(policy.allows(Role::Admin, action));
            assert!(!policy.allows(Role::Moderator, action));
            assert!(!policy.allows(Role::Reader, action));
        }
    }

    #[test]
    fn default_policy_lets_moderators_edit() {
        let policy = Policy::default();
        for action in [Action::EditBook, Action::EditReview] {
            assert!(policy.allows(Role::Admin, action));
            assert!(policy.allows(Role::Moderator, action));
            assert!(!policy.allows(Role::Reader, action));
        }
    }
}
