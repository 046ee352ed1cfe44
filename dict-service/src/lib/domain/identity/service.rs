use std::sync::Arc;

use auth::AccessGuard;
use auth::Claims;
use auth::PasswordHasher;
use auth::Role;
use auth::TokenCodec;
use auth::TokenService;
use chrono::Utc;

use crate::identity::errors::IdentityError;
use crate::identity::models::CreateUserCommand;
use crate::identity::models::Identity;
use crate::identity::models::IdentityId;
use crate::identity::models::IdentityUpdate;
use crate::identity::models::RegisterCommand;
use crate::identity::ports::IdentityRepository;

/// One guard per privileged operation, with the allowed-role set fixed at
/// service construction. User administration is admin-only across the board.
struct AdminGuards {
    list_users: AccessGuard,
    create_user: AccessGuard,
    change_role: AccessGuard,
    block_user: AccessGuard,
    unblock_user: AccessGuard,
    list_blocked: AccessGuard,
    list_unblocked: AccessGuard,
}

impl AdminGuards {
    fn new(codec: &Arc<TokenCodec>) -> Self {
        let admin_only = || AccessGuard::new(Arc::clone(codec), [Role::Admin]);
        Self {
            list_users: admin_only(),
            create_user: admin_only(),
            change_role: admin_only(),
            block_user: admin_only(),
            unblock_user: admin_only(),
            list_blocked: admin_only(),
            list_unblocked: admin_only(),
        }
    }
}

/// Authentication and identity administration service.
///
/// Login and registration issue stateless signed tokens; everything
/// privileged goes through a guard whose allowed-role set was declared
/// when the service was built.
pub struct IdentityService<IR>
where
    IR: IdentityRepository,
{
    repository: Arc<IR>,
    password_hasher: PasswordHasher,
    token_service: TokenService,
    guards: AdminGuards,
}

impl<IR> IdentityService<IR>
where
    IR: IdentityRepository,
{
    /// Create the service with injected dependencies.
    pub fn new(
        repository: Arc<IR>,
        token_service: TokenService,
        password_hasher: PasswordHasher,
    ) -> Self {
        let guards = AdminGuards::new(token_service.codec());
        Self {
            repository,
            password_hasher,
            token_service,
            guards,
        }
    }

    /// Verify credentials and issue a token.
    ///
    /// Unknown username, wrong password, and a blocked account all collapse
    /// to `Denied`; the distinction exists only in server-side logs.
    ///
    /// # Errors
    /// * `Denied` - Credentials did not authenticate
    /// * `Password` - Stored hash is malformed (corrupted record)
    pub async fn login(&self, username: &str, password: &str) -> Result<String, IdentityError> {
        let Some(identity) = self.repository.find_by_username(username).await? else {
            tracing::debug!(username, "login rejected: unknown username");
            return Err(IdentityError::Denied);
        };

        if identity.blocked {
            tracing::debug!(username, "login rejected: account is blocked");
            return Err(IdentityError::Denied);
        }

        if !self
            .password_hasher
            .verify(password, &identity.password_hash)?
        {
            tracing::debug!(username, "login rejected: wrong password");
            return Err(IdentityError::Denied);
        }

        let token = self
            .token_service
            .issue(identity.username.as_str(), identity.role)?;
        tracing::info!(username, role = %identity.role, "login succeeded");
        Ok(token)
    }

    /// Register a new identity with the default role and issue a token.
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` / `EmailAlreadyExists` - Uniqueness violated
    pub async fn register(&self, command: RegisterCommand) -> Result<String, IdentityError> {
        if let Some(existing) = self
            .repository
            .find_by_username(command.username.as_str())
            .await?
        {
            return Err(IdentityError::UsernameAlreadyExists(
                existing.username.to_string(),
            ));
        }
        if let Some(existing) = self
            .repository
            .find_by_email(command.email.as_str())
            .await?
        {
            return Err(IdentityError::EmailAlreadyExists(existing.email.to_string()));
        }

        let password_hash = self.password_hasher.hash(&command.password)?;
        let identity = Identity {
            id: IdentityId::new(),
            username: command.username,
            email: command.email,
            password_hash,
            role: Role::NormalUser,
            blocked: false,
            created_at: Utc::now(),
        };

        let created = self.repository.insert(identity).await?;
        tracing::info!(username = %created.username, "identity registered");

        Ok(self
            .token_service
            .issue(created.username.as_str(), created.role)?)
    }

    /// All identities except the acting admin.
    pub async fn list_users(&self, token: &str) -> Result<Vec<Identity>, IdentityError> {
        let claims = self.authorize(&self.guards.list_users, token)?;
        let identities = self.repository.list_all().await?;
        Ok(identities
            .into_iter()
            .filter(|identity| identity.username.as_str() != claims.sub)
            .collect())
    }

    /// Blocked identities.
    pub async fn list_blocked(&self, token: &str) -> Result<Vec<Identity>, IdentityError> {
        self.authorize(&self.guards.list_blocked, token)?;
        let identities = self.repository.list_all().await?;
        Ok(identities
            .into_iter()
            .filter(|identity| identity.blocked)
            .collect())
    }

    /// Unblocked identities, excluding the acting admin.
    pub async fn list_unblocked(&self, token: &str) -> Result<Vec<Identity>, IdentityError> {
        let claims = self.authorize(&self.guards.list_unblocked, token)?;
        let identities = self.repository.list_all().await?;
        Ok(identities
            .into_iter()
            .filter(|identity| !identity.blocked && identity.username.as_str() != claims.sub)
            .collect())
    }

    /// Create an identity with an explicit role.
    ///
    /// Creating an admin demotes the acting admin to `power_user` in the
    /// same transaction and requires explicit confirmation.
    pub async fn create_user(
        &self,
        token: &str,
        command: CreateUserCommand,
    ) -> Result<Identity, IdentityError> {
        let claims = self.authorize(&self.guards.create_user, token)?;

        if self
            .repository
            .find_by_username(command.username.as_str())
            .await?
            .is_some()
        {
            return Err(IdentityError::UsernameAlreadyExists(
                command.username.to_string(),
            ));
        }
        if self
            .repository
            .find_by_email(command.email.as_str())
            .await?
            .is_some()
        {
            return Err(IdentityError::EmailAlreadyExists(command.email.to_string()));
        }

        let password_hash = self.password_hasher.hash(&command.password)?;
        let identity = Identity {
            id: IdentityId::new(),
            username: command.username,
            email: command.email,
            password_hash,
            role: command.role,
            blocked: false,
            created_at: Utc::now(),
        };

        if command.role == Role::Admin {
            if !command.confirm_admin_downgrade {
                return Err(IdentityError::ConfirmationRequired);
            }
            let acting = self.acting_identity(&claims).await?;
            let created = self.repository.insert_admin(identity, &acting.id).await?;
            tracing::info!(
                created = %created.username,
                demoted = %acting.username,
                "admin created; acting admin demoted to power_user"
            );
            Ok(created)
        } else {
            self.repository.insert(identity).await
        }
    }

    /// Change a user's role.
    ///
    /// Promoting to admin requires confirmation and atomically demotes the
    /// acting admin. A token minted for the acting admin before this call
    /// keeps reporting the old role until it expires or is reissued.
    pub async fn change_role(
        &self,
        token: &str,
        target: &IdentityId,
        new_role: Role,
        confirm_admin_downgrade: bool,
    ) -> Result<(), IdentityError> {
        let claims = self.authorize(&self.guards.change_role, token)?;

        let target_identity = self
            .repository
            .find_by_id(target)
            .await?
            .ok_or_else(|| IdentityError::NotFound(target.to_string()))?;
        if target_identity.username.as_str() == claims.sub {
            return Err(IdentityError::CannotTargetSelf);
        }

        if new_role == Role::Admin {
            if !confirm_admin_downgrade {
                return Err(IdentityError::ConfirmationRequired);
            }
            let acting = self.acting_identity(&claims).await?;
            self.repository.promote_to_admin(target, &acting.id).await?;
            tracing::info!(
                promoted = %target_identity.username,
                demoted = %acting.username,
                "role changed to admin; acting admin demoted to power_user"
            );
        } else {
            self.repository
                .update(
                    target,
                    IdentityUpdate {
                        role: Some(new_role),
                        ..IdentityUpdate::default()
                    },
                )
                .await?;
            tracing::info!(target = %target_identity.username, role = %new_role, "role changed");
        }

        Ok(())
    }

    /// Set the block flag on another account.
    pub async fn block_user(
        &self,
        token: &str,
        target: &IdentityId,
    ) -> Result<(), IdentityError> {
        let claims = self.authorize(&self.guards.block_user, token)?;
        let target_identity = self
            .repository
            .find_by_id(target)
            .await?
            .ok_or_else(|| IdentityError::NotFound(target.to_string()))?;

        if target_identity.username.as_str() == claims.sub {
            return Err(IdentityError::CannotTargetSelf);
        }
        if target_identity.blocked {
            return Err(IdentityError::AlreadyBlocked(
                target_identity.username.to_string(),
            ));
        }

        self.repository
            .update(
                target,
                IdentityUpdate {
                    blocked: Some(true),
                    ..IdentityUpdate::default()
                },
            )
            .await?;
        tracing::info!(target = %target_identity.username, "user blocked");
        Ok(())
    }

    /// Clear the block flag on another account.
    pub async fn unblock_user(
        &self,
        token: &str,
        target: &IdentityId,
    ) -> Result<(), IdentityError> {
        let claims = self.authorize(&self.guards.unblock_user, token)?;
        let target_identity = self
            .repository
            .find_by_id(target)
            .await?
            .ok_or_else(|| IdentityError::NotFound(target.to_string()))?;

        if target_identity.username.as_str() == claims.sub {
            return Err(IdentityError::CannotTargetSelf);
        }
        if !target_identity.blocked {
            return Err(IdentityError::NotBlocked(
                target_identity.username.to_string(),
            ));
        }

        self.repository
            .update(
                target,
                IdentityUpdate {
                    blocked: Some(false),
                    ..IdentityUpdate::default()
                },
            )
            .await?;
        tracing::info!(target = %target_identity.username, "user unblocked");
        Ok(())
    }

    fn authorize(&self, guard: &AccessGuard, token: &str) -> Result<Claims, IdentityError> {
        guard.authorize(token).ok_or(IdentityError::Denied)
    }

    async fn acting_identity(&self, claims: &Claims) -> Result<Identity, IdentityError> {
        self.repository
            .find_by_username(&claims.sub)
            .await?
            .ok_or_else(|| IdentityError::NotFound(claims.sub.clone()))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use ed25519_dalek::SigningKey;
    use mockall::mock;
    use mockall::predicate::*;

    use super::*;
    use crate::identity::models::EmailAddress;
    use crate::identity::models::Username;

    mock! {
        pub TestIdentityRepository {}

        #[async_trait]
        impl IdentityRepository for TestIdentityRepository {
            async fn insert(&self, identity: Identity) -> Result<Identity, IdentityError>;
            async fn insert_admin(&self, identity: Identity, acting_admin: &IdentityId) -> Result<Identity, IdentityError>;
            async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, IdentityError>;
            async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, IdentityError>;
            async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, IdentityError>;
            async fn list_all(&self) -> Result<Vec<Identity>, IdentityError>;
            async fn update(&self, id: &IdentityId, update: IdentityUpdate) -> Result<Identity, IdentityError>;
            async fn promote_to_admin(&self, target: &IdentityId, acting_admin: &IdentityId) -> Result<(), IdentityError>;
        }
    }

    fn token_service() -> TokenService {
        let codec = Arc::new(TokenCodec::new(SigningKey::from_bytes(&[5u8; 32])));
        TokenService::new(codec, 3600)
    }

    fn service(repository: MockTestIdentityRepository) -> IdentityService<MockTestIdentityRepository> {
        IdentityService::new(Arc::new(repository), token_service(), PasswordHasher::new())
    }

    fn identity_with_password(username: &str, role: Role, password: &str) -> Identity {
        Identity {
            id: IdentityId::new(),
            username: Username::new(username.to_string()).unwrap(),
            email: EmailAddress::new(format!("{username}@example.com")).unwrap(),
            password_hash: PasswordHasher::new().hash(password).unwrap(),
            role,
            blocked: false,
            created_at: Utc::now(),
        }
    }

    fn stub_identity(username: &str, role: Role) -> Identity {
        Identity {
            id: IdentityId::new(),
            username: Username::new(username.to_string()).unwrap(),
            email: EmailAddress::new(format!("{username}@example.com")).unwrap(),
            password_hash: "$argon2id$test_hash".to_string(),
            role,
            blocked: false,
            created_at: Utc::now(),
        }
    }

    fn admin_token(service: &IdentityService<MockTestIdentityRepository>, sub: &str) -> String {
        service.token_service.issue(sub, Role::Admin).unwrap()
    }

    #[tokio::test]
    async fn test_login_issues_token_with_stored_role() {
        let mut repository = MockTestIdentityRepository::new();
        let alice = identity_with_password("alice", Role::PowerUser, "pw1");

        let returned = alice.clone();
        repository
            .expect_find_by_username()
            .with(eq("alice"))
            .times(1)
            .returning(move |_| Ok(Some(returned.clone())));

        let service = service(repository);
        let token = service.login("alice", "pw1").await.expect("login failed");

        let claims = service
            .token_service
            .codec()
            .extract_claims(&token)
            .expect("token should be valid immediately after issuance");
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::PowerUser);
    }

    #[tokio::test]
    async fn test_login_failures_collapse_to_denied() {
        // Unknown username
        let mut repository = MockTestIdentityRepository::new();
        repository
            .expect_find_by_username()
            .times(1)
            .returning(|_| Ok(None));
        let service_unknown = service(repository);
        assert!(matches!(
            service_unknown.login("ghost", "pw").await,
            Err(IdentityError::Denied)
        ));

        // Wrong password - same denial, different server-side log only
        let mut repository = MockTestIdentityRepository::new();
        let alice = identity_with_password("alice", Role::NormalUser, "pw1");
        repository
            .expect_find_by_username()
            .times(1)
            .returning(move |_| Ok(Some(alice.clone())));
        let service_wrong = service(repository);
        assert!(matches!(
            service_wrong.login("alice", "wrong").await,
            Err(IdentityError::Denied)
        ));
    }

    #[tokio::test]
    async fn test_login_blocked_account_is_denied() {
        let mut repository = MockTestIdentityRepository::new();
        let mut alice = identity_with_password("alice", Role::NormalUser, "pw1");
        alice.blocked = true;
        repository
            .expect_find_by_username()
            .times(1)
            .returning(move |_| Ok(Some(alice.clone())));

        let service = service(repository);
        assert!(matches!(
            service.login("alice", "pw1").await,
            Err(IdentityError::Denied)
        ));
    }

    #[tokio::test]
    async fn test_register_defaults_to_normal_user() {
        let mut repository = MockTestIdentityRepository::new();
        repository
            .expect_find_by_username()
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_insert()
            .withf(|identity| {
                identity.role == Role::NormalUser
                    && !identity.blocked
                    && identity.password_hash.starts_with("$argon2")
            })
            .times(1)
            .returning(|identity| Ok(identity));

        let service = service(repository);
        let command = RegisterCommand::new(
            Username::new("alice".to_string()).unwrap(),
            EmailAddress::new("alice@x.com".to_string()).unwrap(),
            "pw1".to_string(),
        );

        let token = service.register(command).await.expect("register failed");
        let claims = service.token_service.codec().extract_claims(&token).unwrap();
        assert_eq!(claims.role, Role::NormalUser);
        assert_eq!(claims.sub, "alice");
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() {
        // Duplicate username
        let mut repository = MockTestIdentityRepository::new();
        let existing = stub_identity("alice", Role::NormalUser);
        repository
            .expect_find_by_username()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        let service_username = service(repository);
        let command = RegisterCommand::new(
            Username::new("alice".to_string()).unwrap(),
            EmailAddress::new("other@x.com".to_string()).unwrap(),
            "pw".to_string(),
        );
        assert!(matches!(
            service_username.register(command).await,
            Err(IdentityError::UsernameAlreadyExists(_))
        ));

        // Same email, different username
        let mut repository = MockTestIdentityRepository::new();
        repository
            .expect_find_by_username()
            .times(1)
            .returning(|_| Ok(None));
        let existing = stub_identity("alice", Role::NormalUser);
        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        let service_email = service(repository);
        let command = RegisterCommand::new(
            Username::new("bob".to_string()).unwrap(),
            EmailAddress::new("alice@example.com".to_string()).unwrap(),
            "pw".to_string(),
        );
        assert!(matches!(
            service_email.register(command).await,
            Err(IdentityError::EmailAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_admin_operations_deny_non_admin_tokens() {
        let service = service(MockTestIdentityRepository::new());
        for role in [Role::NormalUser, Role::PowerUser] {
            let token = service.token_service.issue("mallory", role).unwrap();
            assert!(matches!(
                service.list_users(&token).await,
                Err(IdentityError::Denied)
            ));
            assert!(matches!(
                service
                    .change_role(&token, &IdentityId::new(), Role::PowerUser, false)
                    .await,
                Err(IdentityError::Denied)
            ));
        }
        assert!(matches!(
            service.list_users("").await,
            Err(IdentityError::Denied)
        ));
    }

    #[tokio::test]
    async fn test_list_users_excludes_acting_admin() {
        let mut repository = MockTestIdentityRepository::new();
        let users = vec![
            stub_identity("root", Role::Admin),
            stub_identity("alice", Role::NormalUser),
        ];
        repository
            .expect_list_all()
            .times(1)
            .returning(move || Ok(users.clone()));

        let service = service(repository);
        let token = admin_token(&service, "root");
        let listed = service.list_users(&token).await.expect("list failed");

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].username.as_str(), "alice");
    }

    #[tokio::test]
    async fn test_change_role_to_admin_is_atomic_with_downgrade() {
        let mut repository = MockTestIdentityRepository::new();
        let root = stub_identity("root", Role::Admin);
        let bob = stub_identity("bob", Role::NormalUser);
        let root_id = root.id;
        let bob_id = bob.id;

        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(bob.clone())));
        repository
            .expect_find_by_username()
            .with(eq("root"))
            .times(1)
            .returning(move |_| Ok(Some(root.clone())));
        // Both writes happen through the single transactional port method
        repository
            .expect_promote_to_admin()
            .withf(move |target, acting| *target == bob_id && *acting == root_id)
            .times(1)
            .returning(|_, _| Ok(()));
        repository.expect_update().times(0);

        let service = service(repository);
        let token = admin_token(&service, "root");
        service
            .change_role(&token, &bob_id, Role::Admin, true)
            .await
            .expect("change_role failed");

        // Stale-authorization window: the acting admin's pre-change token
        // still carries the admin role and still authorizes admin guards
        // until it expires or is reissued.
        let claims = service.token_service.codec().extract_claims(&token).unwrap();
        assert_eq!(claims.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_change_role_to_admin_requires_confirmation() {
        let mut repository = MockTestIdentityRepository::new();
        let bob = stub_identity("bob", Role::NormalUser);
        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(bob.clone())));
        repository.expect_promote_to_admin().times(0);

        let service = service(repository);
        let token = admin_token(&service, "root");
        assert!(matches!(
            service
                .change_role(&token, &IdentityId::new(), Role::Admin, false)
                .await,
            Err(IdentityError::ConfirmationRequired)
        ));
    }

    #[tokio::test]
    async fn test_change_role_cannot_target_self() {
        let mut repository = MockTestIdentityRepository::new();
        let root = stub_identity("root", Role::Admin);
        let root_id = root.id;
        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(root.clone())));

        let service = service(repository);
        let token = admin_token(&service, "root");
        assert!(matches!(
            service
                .change_role(&token, &root_id, Role::PowerUser, false)
                .await,
            Err(IdentityError::CannotTargetSelf)
        ));
    }

    #[tokio::test]
    async fn test_change_role_below_admin_is_plain_update() {
        let mut repository = MockTestIdentityRepository::new();
        let bob = stub_identity("bob", Role::NormalUser);
        let bob_id = bob.id;
        let updated = stub_identity("bob", Role::PowerUser);

        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(bob.clone())));
        repository
            .expect_update()
            .withf(move |id, update| {
                *id == bob_id && update.role == Some(Role::PowerUser) && update.blocked.is_none()
            })
            .times(1)
            .returning(move |_, _| Ok(updated.clone()));
        repository.expect_promote_to_admin().times(0);

        let service = service(repository);
        let token = admin_token(&service, "root");
        service
            .change_role(&token, &bob_id, Role::PowerUser, false)
            .await
            .expect("change_role failed");
    }

    #[tokio::test]
    async fn test_create_admin_goes_through_transactional_insert() {
        let mut repository = MockTestIdentityRepository::new();
        let root = stub_identity("root", Role::Admin);
        let root_id = root.id;

        repository
            .expect_find_by_username()
            .with(eq("eve"))
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_find_by_username()
            .with(eq("root"))
            .times(1)
            .returning(move |_| Ok(Some(root.clone())));
        repository
            .expect_insert_admin()
            .withf(move |identity, acting| identity.role == Role::Admin && *acting == root_id)
            .times(1)
            .returning(|identity, _| Ok(identity));
        repository.expect_insert().times(0);

        let service = service(repository);
        let token = admin_token(&service, "root");
        let command = CreateUserCommand {
            username: Username::new("eve".to_string()).unwrap(),
            email: EmailAddress::new("eve@x.com".to_string()).unwrap(),
            password: "pw".to_string(),
            role: Role::Admin,
            confirm_admin_downgrade: true,
        };

        let created = service.create_user(&token, command).await.expect("create failed");
        assert_eq!(created.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_create_admin_requires_confirmation() {
        let mut repository = MockTestIdentityRepository::new();
        repository
            .expect_find_by_username()
            .with(eq("eve"))
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        // Without confirmation, nothing may be written
        repository.expect_insert_admin().times(0);
        repository.expect_insert().times(0);

        let service = service(repository);
        let token = admin_token(&service, "root");
        let command = CreateUserCommand {
            username: Username::new("eve".to_string()).unwrap(),
            email: EmailAddress::new("eve@x.com".to_string()).unwrap(),
            password: "pw".to_string(),
            role: Role::Admin,
            confirm_admin_downgrade: false,
        };

        assert!(matches!(
            service.create_user(&token, command).await,
            Err(IdentityError::ConfirmationRequired)
        ));
    }

    #[tokio::test]
    async fn test_block_and_unblock_edge_cases() {
        // Blocking an already-blocked user is a descriptive error
        let mut repository = MockTestIdentityRepository::new();
        let mut bob = stub_identity("bob", Role::NormalUser);
        bob.blocked = true;
        let bob_id = bob.id;
        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(bob.clone())));
        let service_blocked = service(repository);
        let token = admin_token(&service_blocked, "root");
        assert!(matches!(
            service_blocked.block_user(&token, &bob_id).await,
            Err(IdentityError::AlreadyBlocked(_))
        ));

        // Unblocking a user who is not blocked
        let mut repository = MockTestIdentityRepository::new();
        let carol = stub_identity("carol", Role::NormalUser);
        let carol_id = carol.id;
        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(carol.clone())));
        let service_unblocked = service(repository);
        let token = admin_token(&service_unblocked, "root");
        assert!(matches!(
            service_unblocked.unblock_user(&token, &carol_id).await,
            Err(IdentityError::NotBlocked(_))
        ));
    }

    #[tokio::test]
    async fn test_block_sets_flag_through_partial_update() {
        let mut repository = MockTestIdentityRepository::new();
        let bob = stub_identity("bob", Role::NormalUser);
        let bob_id = bob.id;
        let mut blocked = stub_identity("bob", Role::NormalUser);
        blocked.blocked = true;

        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(bob.clone())));
        repository
            .expect_update()
            .withf(move |id, update| {
                *id == bob_id && update.blocked == Some(true) && update.role.is_none()
            })
            .times(1)
            .returning(move |_, _| Ok(blocked.clone()));

        let service = service(repository);
        let token = admin_token(&service, "root");
        service
            .block_user(&token, &bob_id)
            .await
            .expect("block failed");
    }
}
