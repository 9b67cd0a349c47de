use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Shared models for the formstack server and its web client

// ============ Questions & Answers ============

/// Number of storage slots available to each question type.
pub const SLOTS_PER_TYPE: usize = 4;

/// Total number of question (or answer) slots a template or form can hold.
pub const TOTAL_SLOTS: usize = SLOTS_PER_TYPE * TypeTag::ALL.len();

/// The expected shape of an answer to a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    String,
    Int,
    Text,
    Bool,
}

impl TypeTag {
    /// Every type tag, in the order slots are stored and decoded.
    pub const ALL: [TypeTag; 4] = [TypeTag::String, TypeTag::Int, TypeTag::Text, TypeTag::Bool];

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Int => "int",
            TypeTag::Text => "text",
            TypeTag::Bool => "bool",
        }
    }

    /// Capitalised form used inside storage field names (`customInt2Answer`).
    pub fn canonical(&self) -> &'static str {
        match self {
            TypeTag::String => "String",
            TypeTag::Int => "Int",
            TypeTag::Text => "Text",
            TypeTag::Bool => "Bool",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "string" => Some(TypeTag::String),
            "int" => Some(TypeTag::Int),
            "text" => Some(TypeTag::Text),
            "bool" => Some(TypeTag::Bool),
            _ => None,
        }
    }

    /// Whether `value` is an acceptable answer for a question of this type.
    /// `null` is accepted for every type and means "not answered".
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (TypeTag::String | TypeTag::Text, Value::String(_)) => true,
            (TypeTag::Int, Value::Number(n)) => n.is_i64(),
            (TypeTag::Bool, Value::Bool(_)) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "type")]
    pub kind: TypeTag,
    pub question: String,
    #[serde(default)]
    pub description: String,
}

impl Question {
    pub fn new(kind: TypeTag, question: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            question: question.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(rename = "type")]
    pub kind: TypeTag,
    #[serde(default)]
    pub answer: Value,
}

impl Answer {
    pub fn new(kind: TypeTag, answer: impl Into<Value>) -> Self {
        Self {
            kind,
            answer: answer.into(),
        }
    }
}

/// A template question paired with one user's answer to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedEntry {
    #[serde(rename = "type")]
    pub kind: TypeTag,
    pub question: String,
    pub description: String,
    pub answer: Value,
}

// ============ Templates ============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateMode {
    #[default]
    Public,
    Private,
}

impl TemplateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateMode::Public => "public",
            TemplateMode::Private => "private",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(TemplateMode::Public),
            "private" => Some(TemplateMode::Private),
            _ => None,
        }
    }
}

/// Template listing entry (no questions)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub title: String,
    pub description: String,
    pub topic: String,
    pub tags: Vec<String>,
    pub mode: TemplateMode,
    pub submission_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    #[serde(flatten)]
    pub summary: TemplateSummary,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub mode: TemplateMode,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TemplateResponse {
    pub template: Template,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TemplateListResponse {
    pub templates: Vec<TemplateSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TagListResponse {
    pub tags: Vec<TagCount>,
}

// ============ Forms ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormRequest {
    #[serde(default)]
    pub answers: Vec<Answer>,
}

/// Submission listing entry (no answers)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSummary {
    pub id: i64,
    pub template_id: i64,
    pub template_title: String,
    pub user_id: i64,
    pub user_name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A submission with its template's questions and the submitted answers merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormView {
    #[serde(flatten)]
    pub summary: FormSummary,
    pub entries: Vec<MergedEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FormResponse {
    pub form: FormView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FormListResponse {
    pub forms: Vec<FormSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FormViewListResponse {
    pub forms: Vec<FormView>,
}

// ============ Paging & Search ============

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerStatus {
    pub status: String,
    pub version: String,
    pub uptime: u64,
}

// ============ Authentication & User Management ============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token pair returned by register, login and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Authenticated user attached to each request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl UserInfo {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// User model (full details, including password hash - only for internal use)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip)] // Never send password hash to client
    pub password_hash: String,
    pub is_blocked: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_login_at: Option<i64>,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: 0, // Will be set by database AUTOINCREMENT
            name,
            email,
            role: Role::User,
            password_hash,
            is_blocked: false,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    pub fn info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            username: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<Role>,
    pub is_blocked: Option<bool>,
}

// ============ Integrations ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    High,
    Average,
    Low,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::High => "High",
            TicketPriority::Average => "Average",
            TicketPriority::Low => "Low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "high" => Some(TicketPriority::High),
            "average" => Some(TicketPriority::Average),
            "low" => Some(TicketPriority::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTicketRequest {
    pub summary: String,
    pub priority: TicketPriority,
    pub template_id: Option<i64>,
    /// Page the user was on when reporting
    pub link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraTicket {
    pub id: i64,
    pub user_id: i64,
    pub issue_key: String,
    pub url: String,
    pub summary: String,
    pub priority: TicketPriority,
    pub template_id: Option<i64>,
    pub created_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JiraTicketResponse {
    pub ticket: JiraTicket,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JiraTicketListResponse {
    pub tickets: Vec<JiraTicket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContactRequest {
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactResponse {
    pub account_id: String,
    pub contact_id: String,
}
