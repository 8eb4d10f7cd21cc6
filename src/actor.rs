//! Caller identity for mutating operations.
//!
//! Authentication itself happens upstream (gateway). Every request reaches
//! this service with `X-Actor-Id` and `X-Actor-Role` headers, and the actor
//! is threaded explicitly through each mutating call so approvals, locks and
//! cascades always record who performed them.

use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};
use strum_macros::{Display, EnumString};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Admin,
    Hr,
    Employee,
    System,
}

#[derive(Debug, Clone)]
pub struct Actor {
    pub id: u64,
    pub role: Role,
}

impl FromRequest for Actor {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|h| h.to_str().ok())
                .map(str::to_owned)
        };

        let id = match header("X-Actor-Id").and_then(|v| v.parse::<u64>().ok()) {
            Some(id) => id,
            None => return ready(Err(ErrorUnauthorized("Missing or invalid X-Actor-Id"))),
        };

        let role = match header("X-Actor-Role").and_then(|v| v.parse::<Role>().ok()) {
            Some(r) => r,
            None => return ready(Err(ErrorUnauthorized("Missing or invalid X-Actor-Role"))),
        };

        ready(Ok(Actor { id, role }))
    }
}

impl Actor {
    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    pub fn require_hr_or_admin(&self) -> actix_web::Result<()> {
        if matches!(self.role, Role::Admin | Role::Hr) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("HR/Admin only"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_as_snake_case() {
        assert_eq!("hr".parse::<Role>().unwrap(), Role::Hr);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::System.to_string(), "system");
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_gates() {
        let hr = Actor { id: 9, role: Role::Hr };
        assert!(hr.require_hr_or_admin().is_ok());
        assert!(hr.require_admin().is_err());

        let employee = Actor { id: 3, role: Role::Employee };
        assert!(employee.require_hr_or_admin().is_err());
    }
}
