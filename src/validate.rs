//! Local form validation run before any request is sent.

use std::collections::BTreeMap;
use std::fmt;

use crate::model::{NewTask, NewTeam, RegistrationForm, TeamMembersRequest};

/// Field name → message, in field order.
///
/// Each field keeps the first rule it failed, matching how the forms show a
/// single message per input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
    order: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a failure for `field` unless it already has one.
    pub fn add(&mut self, field: &str, message: &str) {
        if self.fields.contains_key(field) {
            return;
        }
        self.fields.insert(field.to_string(), message.to_string());
        self.order.push(field.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Message of the first field that failed, in the order checked.
    pub fn first_message(&self) -> Option<&str> {
        self.order.first().and_then(|field| self.get(field))
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self
            .order
            .iter()
            .filter_map(|field| self.get(field))
            .collect();
        if messages.is_empty() {
            f.write_str("Validation failed")
        } else {
            f.write_str(&messages.join("; "))
        }
    }
}

pub fn validate_new_task(task: &NewTask) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if task.title.trim().is_empty() {
        errors.add("title", "Title is required");
    }
    if task.description.trim().is_empty() {
        errors.add("description", "Description is required");
    }
    errors.into_result()
}

pub fn validate_new_team(team: &NewTeam) -> Result<(), ValidationErrors> {
    validate_team_name(&team.name)
}

pub fn validate_team_name(name: &str) -> Result<(), ValidationErrors> {
    if name.trim().is_empty() {
        return Err(ValidationErrors::single("name", "Team name is required"));
    }
    Ok(())
}

pub fn validate_team_members(request: &TeamMembersRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if request.team_id.trim().is_empty() {
        errors.add("team", "Please select a team");
    }
    if request.user_ids.iter().all(|id| id.trim().is_empty()) {
        errors.add("members", "Please select at least one member");
    }
    errors.into_result()
}

pub fn validate_registration(form: &RegistrationForm) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if form.name.trim().chars().count() < 2 {
        errors.add("name", "Name must be at least 2 characters");
    }
    if !is_email(form.email.trim()) {
        errors.add("email", "Invalid email address");
    }

    let password = &form.password;
    if password.chars().count() < 8 {
        errors.add("password", "Password must be at least 8 characters long");
    } else if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.add("password", "Password must contain at least one lowercase letter");
    } else if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.add("password", "Password must contain at least one uppercase letter");
    } else if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.add("password", "Password must contain at least one number");
    }

    if form.password != form.confirm_password {
        errors.add("confirmPassword", "Passwords don't match");
    }

    errors.into_result()
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if email.trim().is_empty() {
        errors.add("email", "Email is required");
    } else if !is_email(email.trim()) {
        errors.add("email", "Invalid email address");
    }
    if password.is_empty() {
        errors.add("password", "Password is required");
    }
    errors.into_result()
}

/// `local@domain.tld` with no whitespace and a dot inside the domain.
fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && tld.len() >= 2 && !host.starts_with('.'),
        None => false,
    }
}
