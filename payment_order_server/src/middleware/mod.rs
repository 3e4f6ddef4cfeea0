mod identity;

pub use identity::{
    principal_from_headers,
    IdentityHeadersFactory,
    IdentityHeadersService,
    DISPLAY_NAME_HEADER,
    EMAIL_HEADER,
    FIRST_NAME_HEADER,
    LAST_NAME_HEADER,
};
