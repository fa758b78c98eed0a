//! Pure access-control decisions over already-fetched data. No I/O happens
//! here; callers hand in a file snapshot and a shares snapshot and get a
//! terminal allow/deny back.

use crate::models::{AccessLevel, FilePatch, FileRecord, Principal, Share};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    View,
    Rename,
    SetVisibility,
    Delete,
    ManageShares,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No verified identity where one is required.
    Unauthenticated,
    /// Identified, but lacking the specific permission.
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// The share level the principal holds on the file, if any. A share row for
/// the owner would be data corruption; it is ignored so owner-level rules
/// always win.
fn share_level_for(principal_id: &str, file: &FileRecord, shares: &[Share]) -> Option<AccessLevel> {
    shares
        .iter()
        .find(|s| s.user_id == principal_id && s.user_id != file.owner_id)
        .map(|s| s.access_level)
}

/// Decision table for a single operation.
///
/// | operation       | allowed for                                    |
/// |-----------------|------------------------------------------------|
/// | View            | public file, owner, or any share               |
/// | Rename          | owner, or write/admin share                    |
/// | SetVisibility   | owner only                                     |
/// | Delete          | owner, or admin share                          |
/// | ManageShares    | owner only                                     |
pub fn authorize(
    principal: &Principal,
    file: &FileRecord,
    shares: &[Share],
    operation: Operation,
) -> Decision {
    let principal_id = match principal.user_id() {
        Some(id) => id,
        None => {
            // Anonymous callers may only view, and only public files.
            return match operation {
                Operation::View if file.is_public => Decision::Allow,
                _ => Decision::Deny(Denial::Unauthenticated),
            };
        }
    };

    if principal_id == file.owner_id {
        return Decision::Allow;
    }

    let level = share_level_for(principal_id, file, shares);

    let allowed = match operation {
        Operation::View => file.is_public || level.is_some(),
        Operation::Rename => matches!(level, Some(AccessLevel::Write) | Some(AccessLevel::Admin)),
        Operation::SetVisibility => false,
        Operation::Delete => matches!(level, Some(AccessLevel::Admin)),
        Operation::ManageShares => false,
    };

    if allowed {
        Decision::Allow
    } else {
        Decision::Deny(Denial::Forbidden)
    }
}

/// Evaluates every field present in the patch independently; if any one
/// fails, the whole patch is denied. The caller must not apply any part of a
/// denied patch.
pub fn authorize_patch(
    principal: &Principal,
    file: &FileRecord,
    shares: &[Share],
    patch: &FilePatch,
) -> Decision {
    let mut operations = Vec::new();
    if patch.original_filename.is_some() {
        operations.push(Operation::Rename);
    }
    if patch.is_public.is_some() {
        operations.push(Operation::SetVisibility);
    }

    for operation in operations {
        if let Decision::Deny(denial) = authorize(principal, file, shares, operation) {
            return Decision::Deny(denial);
        }
    }

    Decision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn file(owner: &str, public: bool) -> FileRecord {
        FileRecord {
            id: "f1".to_string(),
            owner_id: owner.to_string(),
            original_filename: "report.pdf".to_string(),
            storage_key: "key-report.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size_bytes: 100,
            is_public: public,
            created_at: Utc::now(),
        }
    }

    fn share(user: &str, level: AccessLevel) -> Share {
        Share {
            file_id: "f1".to_string(),
            user_id: user.to_string(),
            access_level: level,
        }
    }

    fn user(id: &str) -> Principal {
        Principal::User {
            id: id.to_string(),
            username: id.to_string(),
        }
    }

    const ALL_OPS: [Operation; 5] = [
        Operation::View,
        Operation::Rename,
        Operation::SetVisibility,
        Operation::Delete,
        Operation::ManageShares,
    ];

    #[test]
    fn owner_may_do_everything_regardless_of_shares() {
        let f = file("alice", false);
        let shares = [share("bob", AccessLevel::Read)];
        for op in ALL_OPS {
            assert_eq!(authorize(&user("alice"), &f, &shares, op), Decision::Allow);
        }
    }

    #[test]
    fn corrupted_owner_share_is_ignored() {
        // A share row naming the owner must not change owner-level outcomes,
        // nor grant the owner's rights to anyone else.
        let f = file("alice", false);
        let shares = [share("alice", AccessLevel::Read)];
        for op in ALL_OPS {
            assert_eq!(authorize(&user("alice"), &f, &shares, op), Decision::Allow);
        }
        assert_eq!(
            authorize(&user("bob"), &f, &shares, Operation::View),
            Decision::Deny(Denial::Forbidden)
        );
    }

    #[test]
    fn anonymous_may_only_view_public() {
        let public = file("alice", true);
        let private = file("alice", false);

        assert_eq!(
            authorize(&Principal::Anonymous, &public, &[], Operation::View),
            Decision::Allow
        );
        assert_eq!(
            authorize(&Principal::Anonymous, &private, &[], Operation::View),
            Decision::Deny(Denial::Unauthenticated)
        );
        for op in [
            Operation::Rename,
            Operation::SetVisibility,
            Operation::Delete,
            Operation::ManageShares,
        ] {
            assert_eq!(
                authorize(&Principal::Anonymous, &public, &[], op),
                Decision::Deny(Denial::Unauthenticated)
            );
        }
    }

    #[test]
    fn read_share_views_but_does_not_mutate() {
        let f = file("alice", false);
        let shares = [share("bob", AccessLevel::Read)];

        assert_eq!(authorize(&user("bob"), &f, &shares, Operation::View), Decision::Allow);
        for op in [
            Operation::Rename,
            Operation::SetVisibility,
            Operation::Delete,
            Operation::ManageShares,
        ] {
            assert_eq!(
                authorize(&user("bob"), &f, &shares, op),
                Decision::Deny(Denial::Forbidden)
            );
        }
    }

    #[test]
    fn write_share_renames_but_cannot_delete_or_reshare() {
        let f = file("alice", false);
        let shares = [share("bob", AccessLevel::Write)];

        assert_eq!(authorize(&user("bob"), &f, &shares, Operation::Rename), Decision::Allow);
        assert_eq!(
            authorize(&user("bob"), &f, &shares, Operation::Delete),
            Decision::Deny(Denial::Forbidden)
        );
        assert_eq!(
            authorize(&user("bob"), &f, &shares, Operation::SetVisibility),
            Decision::Deny(Denial::Forbidden)
        );
        assert_eq!(
            authorize(&user("bob"), &f, &shares, Operation::ManageShares),
            Decision::Deny(Denial::Forbidden)
        );
    }

    #[test]
    fn admin_share_deletes_but_never_toggles_visibility_or_shares() {
        let f = file("alice", false);
        let shares = [share("bob", AccessLevel::Admin)];

        assert_eq!(authorize(&user("bob"), &f, &shares, Operation::Rename), Decision::Allow);
        assert_eq!(authorize(&user("bob"), &f, &shares, Operation::Delete), Decision::Allow);
        assert_eq!(
            authorize(&user("bob"), &f, &shares, Operation::SetVisibility),
            Decision::Deny(Denial::Forbidden)
        );
        assert_eq!(
            authorize(&user("bob"), &f, &shares, Operation::ManageShares),
            Decision::Deny(Denial::Forbidden)
        );
    }

    #[test]
    fn unshared_user_cannot_view_private_file() {
        let f = file("alice", false);
        assert_eq!(
            authorize(&user("mallory"), &f, &[], Operation::View),
            Decision::Deny(Denial::Forbidden)
        );
    }

    #[test]
    fn patch_with_any_failing_field_is_denied_whole() {
        let f = file("alice", false);
        let shares = [share("bob", AccessLevel::Write)];

        // Rename alone is fine for a write share.
        let rename_only = FilePatch {
            original_filename: Some("new.pdf".to_string()),
            is_public: None,
        };
        assert_eq!(
            authorize_patch(&user("bob"), &f, &shares, &rename_only),
            Decision::Allow
        );

        // Adding a visibility change poisons the whole patch.
        let rename_and_visibility = FilePatch {
            original_filename: Some("new.pdf".to_string()),
            is_public: Some(true),
        };
        assert_eq!(
            authorize_patch(&user("bob"), &f, &shares, &rename_and_visibility),
            Decision::Deny(Denial::Forbidden)
        );

        // The owner may do both at once.
        assert_eq!(
            authorize_patch(&user("alice"), &f, &shares, &rename_and_visibility),
            Decision::Allow
        );
    }

    #[test]
    fn empty_patch_is_trivially_allowed() {
        // Empty patches are a validation failure upstream, not a permission
        // question; the engine has nothing to deny.
        let f = file("alice", false);
        assert_eq!(
            authorize_patch(&user("bob"), &f, &[], &FilePatch::default()),
            Decision::Allow
        );
    }
}
