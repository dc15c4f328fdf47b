pub mod session;
pub mod token;

pub use session::{
    authenticate, clear_session, current_user, is_authenticated, store_session, AuthSuccess,
};
