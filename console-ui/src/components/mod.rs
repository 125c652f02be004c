mod rule_list;

pub use rule_list::RuleListView;
