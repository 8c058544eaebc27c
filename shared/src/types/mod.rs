pub mod certificate;
pub mod form_errors;
pub mod json_error;
pub mod jwt;
pub mod login;
pub mod menu;
pub mod password;
pub mod register;
pub mod server_config;

pub use self::certificate::*;
pub use self::form_errors::{ERROR_PARAMS, FieldErrors, append_error_params};
pub use self::json_error::{ErrorResponse, ProxyErrorResponse};
pub use self::jwt::{JwtClaims, UserRole};
pub use self::login::{SIGN_IN_RETURN, SignInCredentials, SignInData};
pub use self::menu::{BACKOFFICE_MENU, MAIN_MENU, MENUS_JSON, MenuItem};
pub use self::password::{RequestPasswordData, RequestPasswordResponse};
pub use self::register::{NewAccount, SIGN_UP_RETURN, SIGN_UP_SUCCESS, SignUpData};
pub use self::server_config::*;
