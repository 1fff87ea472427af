use anyhow::Result;
use chrono::Utc;
use log::{info, warn};
use uuid::Uuid;

use crate::{
    db::Database,
    models::{User, UserProgress},
    progress::ProgressLedger,
};

/// Account creation and lookup keyed by lowercased email, plus the active
/// session. A [`ProgressLedger`] exists only while someone is signed in, so
/// recording an attempt without a user is unrepresentable.
///
/// Passwords are stored and compared in the clear; see DESIGN.md.
pub struct IdentityStore {
    db: Database,
    session: Option<ProgressLedger>,
}

impl IdentityStore {
    pub fn new(db: Database) -> Self {
        Self { db, session: None }
    }

    pub fn ledger(&self) -> Option<&ProgressLedger> {
        self.session.as_ref()
    }

    pub fn ledger_mut(&mut self) -> Option<&mut ProgressLedger> {
        self.session.as_mut()
    }

    /// Reloads the persisted active-session pointer, if any, from a previous
    /// run. Returns whether a session was restored.
    pub async fn restore_session(&mut self) -> Result<bool> {
        let Some(user_id) = self.db.get_active_session().await? else {
            return Ok(false);
        };
        match self.db.load_user_progress(&user_id).await? {
            Some(progress) => {
                info!("restored session for {}", progress.user.email);
                self.session = Some(ProgressLedger::new(self.db.clone(), progress));
                Ok(true)
            }
            None => {
                warn!("active session points at unknown user {user_id}; clearing");
                self.db.clear_active_session().await?;
                Ok(false)
            }
        }
    }

    /// Creates an account and signs it in. Returns false when the lowercased
    /// email is already taken; the existing account is left untouched.
    pub async fn signup(&mut self, email: &str, name: &str, password: &str) -> Result<bool> {
        let email = email.trim().to_lowercase();
        if self.db.find_user_id_by_email(&email).await?.is_some() {
            return Ok(false);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.clone(),
            name: name.trim().to_string(),
            password: password.to_string(),
            created_at: now,
            last_login: now,
        };
        let progress = UserProgress::new(user);

        self.db.insert_user_progress(&progress).await?;
        self.db.set_active_session(&progress.user.id).await?;
        info!("account created for {email}");

        self.session = Some(ProgressLedger::new(self.db.clone(), progress));
        Ok(true)
    }

    /// Signs in an existing account. Returns false on unknown email or
    /// password mismatch, without distinguishing the two to the caller.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<bool> {
        let email = email.trim().to_lowercase();
        let Some(user_id) = self.db.find_user_id_by_email(&email).await? else {
            return Ok(false);
        };
        let Some(mut progress) = self.db.load_user_progress(&user_id).await? else {
            return Ok(false);
        };

        if progress.user.password != password {
            return Ok(false);
        }

        progress.user.last_login = Utc::now();
        self.db.save_user_progress(&progress).await?;
        self.db.set_active_session(&user_id).await?;
        info!("{email} signed in");

        self.session = Some(ProgressLedger::new(self.db.clone(), progress));
        Ok(true)
    }

    /// Clears the active-session marker and drops the in-memory session.
    /// Stored progress is untouched.
    pub async fn logout(&mut self) -> Result<()> {
        self.db.clear_active_session().await?;
        if let Some(ledger) = self.session.take() {
            info!("{} signed out", ledger.progress().user.email);
        }
        Ok(())
    }
}
