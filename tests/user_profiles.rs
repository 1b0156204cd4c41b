//! User Profile Tests
//!
//! - First sign-in creates a citizen profile, later calls return it as is
//! - Role and reputation changes are admin-only and never touch admins
//! - Batch promotion moves only eligible novices

use std::sync::Arc;

use axiomtree::auth::{ActorContext, Reputation, ReputationKind, Role};
use axiomtree::model::{Dataset, ValidationError};
use axiomtree::service::Catalog;
use axiomtree::store::{import_dataset, MemoryStore};
use axiomtree::{CoreError, GovernanceConfig};

fn catalog() -> Catalog<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    import_dataset(store.as_ref(), &Dataset::additive_magma()).unwrap();
    Catalog::new(store, GovernanceConfig::default())
}

fn admin() -> ActorContext {
    ActorContext::admin("systemAdmin")
}

// =============================================================================
// Sign-in
// =============================================================================

#[test]
fn test_first_sync_creates_citizen() {
    let catalog = catalog();
    let profile = catalog
        .sync_user("ada", Some("Ada".into()), Some("ada@example.org".into()))
        .unwrap();
    assert_eq!(profile.role, Role::Citizen);
    assert_eq!(profile.reputation, Reputation::new(0, 1));

    catalog
        .adjust_reputation(&admin(), "ada", ReputationKind::Creation, 7)
        .unwrap();
    let again = catalog.sync_user("ada", None, None).unwrap();
    assert_eq!(again.reputation.creation, 7);
    assert_eq!(again.display_name.as_deref(), Some("Ada"));
}

#[test]
fn test_blank_uid_needs_sign_in() {
    assert!(matches!(
        catalog().sync_user("  ", None, None),
        Err(CoreError::AuthenticationRequired)
    ));
}

#[test]
fn test_actor_comes_from_stored_role() {
    let catalog = catalog();
    assert_eq!(catalog.actor_for("userNovice").unwrap().role, Role::Novice);
    assert_eq!(catalog.actor_for("systemAdmin").unwrap().role, Role::Admin);
    assert!(matches!(
        catalog.actor_for("stranger"),
        Err(CoreError::AuthenticationRequired)
    ));
}

// =============================================================================
// Role management
// =============================================================================

#[test]
fn test_admin_changes_role() {
    let catalog = catalog();
    let profile = catalog
        .update_user_role(&admin(), "userNovice", Role::Citizen)
        .unwrap();
    assert_eq!(profile.role, Role::Citizen);
    assert_eq!(catalog.actor_for("userNovice").unwrap().role, Role::Citizen);
}

#[test]
fn test_admin_profiles_are_protected() {
    let catalog = catalog();
    catalog.sync_user("root2", None, None).unwrap();
    catalog.update_user_role(&admin(), "root2", Role::Admin).unwrap();

    assert!(matches!(
        catalog.update_user_role(&admin(), "root2", Role::Novice),
        Err(CoreError::Validation(ValidationError::ProtectedAdmin(_)))
    ));
    assert!(matches!(
        catalog.adjust_reputation(&admin(), "root2", ReputationKind::Contributor, 5),
        Err(CoreError::Validation(ValidationError::ProtectedAdmin(_)))
    ));

    // Re-asserting the current role is a no-op, not a refusal
    let same = catalog.update_user_role(&admin(), "root2", Role::Admin).unwrap();
    assert_eq!(same.role, Role::Admin);
}

#[test]
fn test_user_management_is_admin_only() {
    let catalog = catalog();
    let citizen = ActorContext::citizen("userContributor");
    assert!(matches!(
        catalog.update_user_role(&citizen, "userNovice", Role::Citizen),
        Err(CoreError::Unauthorized)
    ));
    assert!(matches!(
        catalog.adjust_reputation(&citizen, "userNovice", ReputationKind::Creation, 100),
        Err(CoreError::Unauthorized)
    ));
    assert!(matches!(
        catalog.promote_eligible_novices(&citizen),
        Err(CoreError::Unauthorized)
    ));
    assert!(matches!(
        catalog.update_user_role(&admin(), "ghost", Role::Citizen),
        Err(CoreError::NotFound(_))
    ));
}

// =============================================================================
// Reputation and promotion
// =============================================================================

#[test]
fn test_reputation_can_be_penalized() {
    let catalog = catalog();
    let profile = catalog
        .adjust_reputation(&admin(), "userContributor", ReputationKind::Contributor, -30)
        .unwrap();
    assert_eq!(profile.reputation, Reputation::new(40, -5));

    let unchanged = catalog
        .adjust_reputation(&admin(), "userContributor", ReputationKind::Creation, 0)
        .unwrap();
    assert_eq!(unchanged.reputation, profile.reputation);
}

#[test]
fn test_batch_promotion_moves_eligible_novices_only() {
    let catalog = catalog();

    let promoted = catalog.promote_eligible_novices(&admin()).unwrap();
    assert_eq!(promoted, vec!["userApprentice".to_string()]);

    let data = catalog.dataset().unwrap();
    assert_eq!(data.user("userApprentice").unwrap().role, Role::Citizen);
    assert_eq!(data.user("userNovice").unwrap().role, Role::Novice);

    // userNovice sits at 12 points; 38 more makes it eligible
    catalog
        .adjust_reputation(&admin(), "userNovice", ReputationKind::Creation, 38)
        .unwrap();
    assert_eq!(
        catalog.promote_eligible_novices(&admin()).unwrap(),
        vec!["userNovice".to_string()]
    );
    assert!(catalog.promote_eligible_novices(&admin()).unwrap().is_empty());
}
