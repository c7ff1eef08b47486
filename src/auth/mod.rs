pub mod claims;
pub mod jwt;
pub mod middleware;
pub mod permissions;

pub use claims::{Claims, UserRole};
pub use jwt::JwtService;
pub use middleware::{AuthMiddleware, AuthenticatedUser};
pub use permissions::{
    Actor, AssignmentIdentityResolver, IdentityResolver, PermissionChecker, Resource,
    RolePermissionChecker,
};
