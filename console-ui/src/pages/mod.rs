mod rules;
mod users;

pub use rules::RulesPage;
pub use users::UsersPage;
