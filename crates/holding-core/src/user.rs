use crate::error::{HoldingError, Result};
use crate::paths;
use crate::types::{ClientType, DocumentCategory, MaritalStatus, Role};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use rand::RngCore;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::OnceLock;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// QualificationData
// ---------------------------------------------------------------------------

/// Personal qualification data required of partner-type clients before the
/// diagnostic phase can progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualificationData {
    #[serde(default)]
    pub cpf: String,
    #[serde(default)]
    pub rg: String,
    #[serde(default)]
    pub marital_status: Option<MaritalStatus>,
    /// Required when married or in a stable union.
    #[serde(default)]
    pub property_regime: Option<String>,
    #[serde(default)]
    pub birth_date: String,
    #[serde(default)]
    pub nationality: String,
    #[serde(default)]
    pub profession: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub declares_income_tax: bool,
}

// ---------------------------------------------------------------------------
// UserDocument
// ---------------------------------------------------------------------------

/// A category-tagged personal document owned by the user record itself,
/// independent of any project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDocument {
    pub id: String,
    pub name: String,
    pub category: DocumentCategory,
    /// Path of the stored blob, relative to the data root.
    pub path: String,
    pub uploaded_at: DateTime<Utc>,
}

impl UserDocument {
    pub fn new(
        name: impl Into<String>,
        category: DocumentCategory,
        path: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            category,
            path: path.into(),
            uploaded_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_type: Option<ClientType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualification: Option<QualificationData>,
    #[serde(default)]
    pub documents: Vec<UserDocument>,
    pub password_hash: String,
    pub password_salt: String,
    #[serde(default)]
    pub requires_password_change: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"))
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
}

impl User {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        password: &str,
    ) -> Result<Self> {
        let email = email.into();
        if !email_regex().is_match(&email) {
            return Err(HoldingError::InvalidEmail(email));
        }
        let now = Utc::now();
        let mut user = Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            email,
            role,
            client_type: None,
            qualification: None,
            documents: Vec::new(),
            password_hash: String::new(),
            password_salt: String::new(),
            requires_password_change: false,
            created_at: now,
            updated_at: now,
        };
        user.set_password(password);
        Ok(user)
    }

    // ---------------------------------------------------------------------------
    // Passwords
    // ---------------------------------------------------------------------------

    pub fn set_password(&mut self, password: &str) {
        let mut salt_bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = base64::engine::general_purpose::STANDARD.encode(salt_bytes);
        self.password_hash = hash_password(&salt, password);
        self.password_salt = salt;
        self.updated_at = Utc::now();
    }

    pub fn verify_password(&self, password: &str) -> bool {
        hash_password(&self.password_salt, password) == self.password_hash
    }

    /// Generate a provisional password, set it, and force a change at first
    /// login. Returns the plaintext so it can be handed to the client once.
    pub fn assign_provisional_password(&mut self) -> String {
        let mut bytes = [0u8; 6];
        rand::thread_rng().fill_bytes(&mut bytes);
        let password = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);
        self.set_password(&password);
        self.requires_password_change = true;
        password
    }

    // ---------------------------------------------------------------------------
    // Data completeness
    // ---------------------------------------------------------------------------

    /// A partner is data-complete when every base qualification field is
    /// filled, a property regime is declared if married or in a stable
    /// union, and a tax-return document exists if they declare income tax.
    ///
    /// Non-partner users are never data-complete (there is nothing to
    /// complete, but the diagnostic gate only asks about partners).
    pub fn is_data_complete(&self) -> bool {
        if self.client_type != Some(ClientType::Partner) {
            return false;
        }
        let Some(q) = &self.qualification else {
            return false;
        };
        let base = !q.cpf.is_empty()
            && !q.rg.is_empty()
            && q.marital_status.is_some()
            && !q.birth_date.is_empty()
            && !q.nationality.is_empty()
            && !q.address.is_empty();
        if !base {
            return false;
        }
        if q.marital_status.is_some_and(|m| m.requires_property_regime())
            && q.property_regime.as_deref().unwrap_or("").is_empty()
        {
            return false;
        }
        if q.declares_income_tax
            && !self
                .documents
                .iter()
                .any(|d| d.category == DocumentCategory::TaxReturn)
        {
            return false;
        }
        true
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    pub fn create(root: &Path, user: User) -> Result<User> {
        if Self::find_by_email(root, &user.email)?.is_some() {
            return Err(HoldingError::UserExists(user.email));
        }
        user.save(root)?;
        Ok(user)
    }

    pub fn load(root: &Path, id: &str) -> Result<Self> {
        let path = paths::user_path(root, id);
        if !path.exists() {
            return Err(HoldingError::UserNotFound(id.to_string()));
        }
        crate::io::load_yaml(&path)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        crate::io::save_yaml(&paths::user_path(root, &self.id), self)
    }

    pub fn delete(root: &Path, id: &str) -> Result<()> {
        let path = paths::user_path(root, id);
        if !path.exists() {
            return Err(HoldingError::UserNotFound(id.to_string()));
        }
        std::fs::remove_file(&path)?;
        Ok(())
    }

    pub fn list(root: &Path) -> Result<Vec<Self>> {
        let users_dir = root.join(paths::USERS_DIR);
        if !users_dir.exists() {
            return Ok(Vec::new());
        }
        let mut users = Vec::new();
        for entry in std::fs::read_dir(&users_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("yaml") {
                users.push(crate::io::load_yaml::<User>(&path)?);
            }
        }
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    pub fn find_by_email(root: &Path, email: &str) -> Result<Option<Self>> {
        Ok(Self::list(root)?.into_iter().find(|u| u.email == email))
    }

    // ---------------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------------

    pub fn set_client_type(&mut self, client_type: ClientType) {
        self.client_type = Some(client_type);
        self.updated_at = Utc::now();
    }

    pub fn set_qualification(&mut self, qualification: QualificationData) {
        self.qualification = Some(qualification);
        self.updated_at = Utc::now();
    }

    pub fn add_document(&mut self, document: UserDocument) {
        self.documents.push(document);
        self.updated_at = Utc::now();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn partner(q: QualificationData, docs: Vec<UserDocument>) -> User {
        let mut user = User::new("Ana", "ana@email.com", Role::Client, "pw").unwrap();
        user.set_client_type(ClientType::Partner);
        user.set_qualification(q);
        user.documents = docs;
        user
    }

    fn full_qualification() -> QualificationData {
        QualificationData {
            cpf: "123.456.789-00".into(),
            rg: "MG-12.345.678".into(),
            marital_status: Some(MaritalStatus::Solteiro),
            property_regime: None,
            birth_date: "1980-05-01".into(),
            nationality: "brasileira".into(),
            profession: "empresária".into(),
            address: "Rua das Acácias 100, Belo Horizonte".into(),
            declares_income_tax: false,
        }
    }

    #[test]
    fn password_verify() {
        let user = User::new("Ana", "ana@email.com", Role::Client, "segredo").unwrap();
        assert!(user.verify_password("segredo"));
        assert!(!user.verify_password("errado"));
    }

    #[test]
    fn provisional_password_forces_change() {
        let mut user = User::new("Ana", "ana@email.com", Role::Client, "x").unwrap();
        let provisional = user.assign_provisional_password();
        assert!(user.requires_password_change);
        assert!(user.verify_password(&provisional));
    }

    #[test]
    fn invalid_email_rejected() {
        assert!(User::new("Ana", "not-an-email", Role::Client, "pw").is_err());
    }

    #[test]
    fn data_complete_with_full_base_fields() {
        let user = partner(full_qualification(), vec![]);
        assert!(user.is_data_complete());
    }

    #[test]
    fn data_complete_rejects_empty_base_field() {
        let mut q = full_qualification();
        q.cpf = String::new();
        assert!(!partner(q, vec![]).is_data_complete());

        let mut q = full_qualification();
        q.address = String::new();
        assert!(!partner(q, vec![]).is_data_complete());

        let mut q = full_qualification();
        q.marital_status = None;
        assert!(!partner(q, vec![]).is_data_complete());
    }

    #[test]
    fn married_partner_needs_property_regime() {
        let mut q = full_qualification();
        q.marital_status = Some(MaritalStatus::Casado);
        assert!(!partner(q.clone(), vec![]).is_data_complete());

        q.property_regime = Some("comunhão parcial".into());
        assert!(partner(q, vec![]).is_data_complete());
    }

    #[test]
    fn stable_union_needs_property_regime() {
        let mut q = full_qualification();
        q.marital_status = Some(MaritalStatus::UniaoEstavel);
        assert!(!partner(q.clone(), vec![]).is_data_complete());

        q.property_regime = Some("separação total".into());
        assert!(partner(q, vec![]).is_data_complete());
    }

    #[test]
    fn income_tax_declarer_needs_tax_return_document() {
        let mut q = full_qualification();
        q.declares_income_tax = true;
        assert!(!partner(q.clone(), vec![]).is_data_complete());

        let doc = UserDocument::new("IRPF 2025", DocumentCategory::TaxReturn, "uploads/x");
        assert!(partner(q, vec![doc]).is_data_complete());
    }

    #[test]
    fn interested_client_is_never_data_complete() {
        let mut user = partner(full_qualification(), vec![]);
        user.set_client_type(ClientType::Interested);
        assert!(!user.is_data_complete());
    }

    #[test]
    fn create_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let user = User::new("Ana", "ana@email.com", Role::Consultant, "pw").unwrap();
        let id = user.id.clone();
        User::create(dir.path(), user).unwrap();

        let loaded = User::load(dir.path(), &id).unwrap();
        assert_eq!(loaded.name, "Ana");
        assert_eq!(loaded.role, Role::Consultant);
    }

    #[test]
    fn duplicate_email_rejected() {
        let dir = TempDir::new().unwrap();
        let a = User::new("Ana", "ana@email.com", Role::Client, "pw").unwrap();
        User::create(dir.path(), a).unwrap();
        let b = User::new("Outra Ana", "ana@email.com", Role::Client, "pw").unwrap();
        assert!(matches!(
            User::create(dir.path(), b),
            Err(HoldingError::UserExists(_))
        ));
    }

    #[test]
    fn find_by_email() {
        let dir = TempDir::new().unwrap();
        let user = User::new("Ana", "ana@email.com", Role::Client, "pw").unwrap();
        User::create(dir.path(), user).unwrap();

        assert!(User::find_by_email(dir.path(), "ana@email.com")
            .unwrap()
            .is_some());
        assert!(User::find_by_email(dir.path(), "bruno@email.com")
            .unwrap()
            .is_none());
    }
}
