//! Referrer attribution: deciding which directory record, if any, a
//! submission's reference points at.
//!
//! Admins and employees share an identifier space and nothing keeps the two
//! collections disjoint. When both hold the same identifier the admin wins.
//! A reference that parses but matches nobody is not an error; the submission
//! is simply unassigned.

use uuid::Uuid;

use crate::{
  referrer::{Admin, Employee},
  store::DashboardStore,
};

/// Which collection a reference resolved into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributionKind {
  Admin,
  Employee,
  Unassigned,
}

/// The outcome of resolving a referrer reference.
#[derive(Debug, Clone)]
pub enum Attribution {
  Admin(Admin),
  Employee(Employee),
  Unassigned,
}

impl Attribution {
  pub fn kind(&self) -> AttributionKind {
    match self {
      Self::Admin(_) => AttributionKind::Admin,
      Self::Employee(_) => AttributionKind::Employee,
      Self::Unassigned => AttributionKind::Unassigned,
    }
  }

  pub fn is_admin(&self) -> bool { matches!(self, Self::Admin(_)) }

  /// The referrer's display name; admins without one show as "Admin".
  pub fn display_name(&self) -> Option<&str> {
    match self {
      Self::Admin(admin) => Some(admin.label()),
      Self::Employee(employee) => Some(&employee.name),
      Self::Unassigned => None,
    }
  }

  pub fn email(&self) -> Option<&str> {
    match self {
      Self::Admin(admin) => Some(&admin.email),
      Self::Employee(employee) => Some(&employee.email),
      Self::Unassigned => None,
    }
  }
}

/// Parse a raw reference into an identifier.
///
/// Only the canonical lowercase hyphenated form is accepted, so a reference
/// either names exactly the string a form link carries or nothing at all.
pub fn parse_reference(raw: &str) -> Option<Uuid> {
  if raw.is_empty() {
    return None;
  }
  let id = Uuid::parse_str(raw).ok()?;
  (id.hyphenated().to_string() == raw).then_some(id)
}

/// Resolve a reference against the directory: admins first, then employees.
pub async fn resolve<S: DashboardStore>(
  store: &S,
  reference: Option<&str>,
) -> Result<Attribution, S::Error> {
  let Some(id) = reference.and_then(parse_reference) else {
    return Ok(Attribution::Unassigned);
  };

  if let Some(admin) = store.get_admin(id).await? {
    return Ok(Attribution::Admin(admin));
  }
  if let Some(employee) = store.get_employee(id).await? {
    return Ok(Attribution::Employee(employee));
  }
  Ok(Attribution::Unassigned)
}

/// Resolve the referrer of an already-stored submission.
///
/// The stored admin flag picks the collection looked in first; if the record
/// there is gone, this falls back to the ordinary admin-first lookup.
pub async fn resolve_stored<S: DashboardStore>(
  store: &S,
  reference: Option<&str>,
  is_admin_referrer: bool,
) -> Result<Attribution, S::Error> {
  let Some(id) = reference.and_then(parse_reference) else {
    return Ok(Attribution::Unassigned);
  };

  if is_admin_referrer {
    if let Some(admin) = store.get_admin(id).await? {
      return Ok(Attribution::Admin(admin));
    }
  } else if let Some(employee) = store.get_employee(id).await? {
    return Ok(Attribution::Employee(employee));
  }
  resolve(store, reference).await
}
