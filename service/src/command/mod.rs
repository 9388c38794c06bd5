//! [`Command`] definition.

pub mod authorize_user_session;
pub mod create_lease;
pub mod create_property;
pub mod create_user;
pub mod create_user_session;
pub mod decide_application;
pub mod delete_property;
pub mod delete_user;
pub mod mark_message_read;
pub mod record_payment;
pub mod send_message;
pub mod settle_payment;
pub mod submit_application;
pub mod transit_lease;
pub mod update_property;
pub mod update_user;
pub mod withdraw_application;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession, create_lease::CreateLease,
    create_property::CreateProperty, create_user::CreateUser,
    create_user_session::CreateUserSession,
    decide_application::DecideApplication, delete_property::DeleteProperty,
    delete_user::DeleteUser, mark_message_read::MarkMessageRead,
    record_payment::RecordPayment, send_message::SendMessage,
    settle_payment::SettlePayment, submit_application::SubmitApplication,
    transit_lease::TransitLease, update_property::UpdateProperty,
    update_user::UpdateUser, withdraw_application::WithdrawApplication,
};
