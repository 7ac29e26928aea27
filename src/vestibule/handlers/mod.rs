pub mod admin;
pub mod health;
pub mod login_page;
pub mod logout;
pub mod session;
