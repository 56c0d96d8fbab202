//! Pre-submission checks for `users` and `drivers` payloads. A failure here
//! means no request is sent.

use serde_json::{Map, Value};

use super::{
    errors::Operation,
    types::{ApiError, DRIVERS, USERS},
};

const ROLES: &[&str] = &["admin", "user", "viewer"];
const USER_FIELDS: &[&str] = &["username", "email", "full_name", "role", "password"];

type FieldErrors = Map<String, Value>;

pub fn validate(resource: &str, operation: Operation, data: &Value) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();
    match (resource, operation) {
        (USERS, Operation::Create) => check_user(data, true, &mut errors),
        (USERS, Operation::Update) => check_user(data, false, &mut errors),
        (DRIVERS, Operation::Create | Operation::Update) => check_driver(data, &mut errors),
        _ => return Ok(()),
    }
    if errors.is_empty() {
        return Ok(());
    }

    let summary = errors
        .values()
        .filter_map(Value::as_str)
        .collect::<Vec<_>>()
        .join("; ");
    log::debug!("{} {:?} rejected before sending: {}", resource, operation, summary);
    Err(ApiError::validation(summary).with_details(Value::Object(errors)))
}

fn text<'a>(data: &'a Value, field: &str) -> Option<&'a str> {
    data.get(field).and_then(Value::as_str)
}

fn reject(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_insert_with(|| Value::String(message.to_string()));
}

fn check_user(data: &Value, creating: bool, errors: &mut FieldErrors) {
    if !creating && USER_FIELDS.iter().all(|f| text(data, f).is_none()) {
        reject(errors, "data", "No fields provided for update");
        return;
    }

    let mut check = |field: &str, rule: fn(&str) -> Result<(), &'static str>, required: &'static str| {
        match text(data, field) {
            Some(value) => {
                if let Err(message) = rule(value) {
                    reject(errors, field, message);
                }
            }
            None if creating => reject(errors, field, required),
            None => {}
        }
    };
    check("username", validate_username, "Username cannot be empty");
    check("email", validate_email, "Email cannot be empty");
    check("full_name", validate_required_name, "Full name cannot be empty");
    check("role", validate_role, "Role is required");

    match text(data, "password") {
        Some(password) if !creating && password.trim().is_empty() => {}
        Some(password) => {
            if let Err(message) = validate_password(password) {
                reject(errors, "password", message);
            }
        }
        None if creating => reject(errors, "password", "Password is required"),
        None => {}
    }
}

fn check_driver(data: &Value, errors: &mut FieldErrors) {
    match text(data, "driver_ref").map(str::trim) {
        None | Some("") => reject(errors, "driver_ref", "Driver reference cannot be empty"),
        Some(r) if r.chars().count() > 50 => {
            reject(errors, "driver_ref", "Driver reference too long (max 50 characters)")
        }
        Some(_) => {}
    }
    for field in ["forename", "surname"] {
        match text(data, field).map(str::trim) {
            None | Some("") => reject(errors, field, "Name fields cannot be empty"),
            Some(name) if name.chars().count() > 50 => {
                reject(errors, field, "Name too long (max 50 characters)")
            }
            Some(_) => {}
        }
    }
    if text(data, "nationality").map_or(true, |n| n.trim().is_empty()) {
        reject(errors, "nationality", "Nationality cannot be empty");
    }
    if let Some(code) = text(data, "code") {
        if code.trim().chars().count() > 3 {
            reject(errors, "code", "Driver code must be 3 characters or less");
        }
    }
    match text(data, "dob") {
        Some(dob) if !dob.trim().is_empty() => {
            if let Err(message) = validate_dob(dob.trim()) {
                reject(errors, "dob", message);
            }
        }
        _ => reject(errors, "dob", "Date of birth is required"),
    }
}

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let username = username.trim();
    if username.is_empty() {
        return Err("Username cannot be empty");
    }
    match username.chars().count() {
        0..=2 => Err("Username must be at least 3 characters long"),
        3..=50 => Ok(()),
        _ => Err("Username too long (max 50 characters)"),
    }
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Email cannot be empty");
    }
    let invalid = "Please enter a valid email address";
    if email.chars().any(char::is_whitespace) {
        return Err(invalid);
    }
    let (local, domain) = email.split_once('@').ok_or(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid);
    }
    let (host, tld) = domain.rsplit_once('.').ok_or(invalid)?;
    if host.is_empty() || tld.is_empty() || host.starts_with('.') {
        return Err(invalid);
    }
    Ok(())
}

fn validate_required_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        Err("Full name cannot be empty")
    } else {
        Ok(())
    }
}

pub fn validate_role(role: &str) -> Result<(), &'static str> {
    if ROLES.contains(&role) {
        Ok(())
    } else {
        Err("Role must be one of: admin, user, viewer")
    }
}

pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 4 {
        Err("Password must be at least 4 characters long")
    } else {
        Ok(())
    }
}

/// `YYYY-MM-DD` with a plausible birth year.
pub fn validate_dob(dob: &str) -> Result<(), &'static str> {
    let parts: Vec<&str> = dob.split('-').collect();
    if parts.len() != 3 {
        return Err("Date must be in YYYY-MM-DD format");
    }
    let numbers: Result<Vec<u32>, _> = parts.iter().map(|p| p.parse::<u32>()).collect();
    let Ok(numbers) = numbers else {
        return Err("Date must contain only numbers in YYYY-MM-DD format");
    };
    let (year, month, day) = (numbers[0], numbers[1], numbers[2]);
    if !(1900..=2010).contains(&year) {
        return Err("Invalid birth year (must be between 1900-2010)");
    }
    if !(1..=12).contains(&month) {
        return Err("Invalid month (must be 1-12)");
    }
    if !(1..=31).contains(&day) {
        return Err("Invalid day (must be 1-31)");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorKind;
    use serde_json::json;

    fn new_user() -> Value {
        json!({
            "username": "carlos",
            "email": "carlos@f1.com",
            "full_name": "Carlos Sainz",
            "role": "user",
            "password": "smooth"
        })
    }

    fn new_driver() -> Value {
        json!({
            "driver_ref": "sainz",
            "number": "55",
            "code": "SAI",
            "forename": "Carlos",
            "surname": "Sainz",
            "dob": "1994-09-01",
            "nationality": "Spanish",
            "url": "http://en.wikipedia.org/wiki/Carlos_Sainz_Jr."
        })
    }

    #[test]
    fn valid_user_and_driver_pass() {
        assert!(validate(USERS, Operation::Create, &new_user()).is_ok());
        assert!(validate(DRIVERS, Operation::Create, &new_driver()).is_ok());
        assert!(validate(DRIVERS, Operation::Update, &new_driver()).is_ok());
    }

    #[test]
    fn other_resources_and_operations_are_not_checked() {
        assert!(validate("races", Operation::Create, &json!({})).is_ok());
        assert!(validate(USERS, Operation::Delete, &json!({})).is_ok());
    }

    #[test]
    fn missing_user_fields_are_reported_together() {
        let err = validate(USERS, Operation::Create, &json!({"username": "al"})).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValidationFailed);
        let details = err.details.unwrap();
        assert_eq!(
            details["username"],
            json!("Username must be at least 3 characters long")
        );
        assert_eq!(details["email"], json!("Email cannot be empty"));
        assert_eq!(details["full_name"], json!("Full name cannot be empty"));
        assert_eq!(details["role"], json!("Role is required"));
        assert_eq!(details["password"], json!("Password is required"));
        assert!(err.error.contains("Email cannot be empty"));
    }

    #[test]
    fn user_update_accepts_partial_payload_and_blank_password() {
        let partial = json!({"id": 4, "full_name": "Carlos Sainz Jr.", "password": ""});
        assert!(validate(USERS, Operation::Update, &partial).is_ok());

        let bad_role = json!({"role": "owner"});
        let err = validate(USERS, Operation::Update, &bad_role).unwrap_err();
        assert_eq!(
            err.details.unwrap()["role"],
            json!("Role must be one of: admin, user, viewer")
        );

        let nothing = json!({"id": 4});
        assert!(validate(USERS, Operation::Update, &nothing).is_err());
    }

    #[test]
    fn email_format_is_checked() {
        for email in ["carlos@f1.com", "a.b@sub.example.org"] {
            assert!(validate_email(email).is_ok(), "{}", email);
        }
        for email in ["carlos", "carlos@", "@f1.com", "carlos@f1", "car los@f1.com", "a@b@c.com", "a@.com"] {
            assert!(validate_email(email).is_err(), "{}", email);
        }
    }

    #[test]
    fn driver_rules_follow_backend_limits() {
        let mut driver = new_driver();
        driver["code"] = json!("SAIN");
        driver["dob"] = json!("2015-01-01");
        driver["forename"] = json!("  ");
        let err = validate(DRIVERS, Operation::Create, &driver).unwrap_err();
        let details = err.details.unwrap();
        assert_eq!(details["code"], json!("Driver code must be 3 characters or less"));
        assert_eq!(
            details["dob"],
            json!("Invalid birth year (must be between 1900-2010)")
        );
        assert_eq!(details["forename"], json!("Name fields cannot be empty"));
    }

    #[test]
    fn dob_format_errors() {
        assert_eq!(validate_dob("1994/09/01"), Err("Date must be in YYYY-MM-DD format"));
        assert_eq!(
            validate_dob("1994-ab-01"),
            Err("Date must contain only numbers in YYYY-MM-DD format")
        );
        assert_eq!(validate_dob("1994-13-01"), Err("Invalid month (must be 1-12)"));
        assert_eq!(validate_dob("1994-12-32"), Err("Invalid day (must be 1-31)"));
        assert!(validate_dob("1900-01-01").is_ok());
    }

    #[test]
    fn username_and_password_limits() {
        assert!(validate_username("abc").is_ok());
        assert!(validate_username(&"x".repeat(51)).is_err());
        assert!(validate_password("1234").is_ok());
        assert!(validate_password("123").is_err());
    }
}
