#[path = "prop_parse_compare.rs"]
mod parse_compare;
#[path = "prop_query.rs"]
mod query;
#[path = "prop_sort.rs"]
mod sort;
