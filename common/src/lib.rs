pub mod filter_value;
pub mod money;
pub mod order_status;
pub mod timestamps;

pub use filter_value::{parse_filter, parse_filter_with, InvalidFilterValue};
pub use money::{Money, MoneyParseError};
pub use order_status::OrderStatus;
pub use timestamps::{get_timestamp_ns, parse_timestamp_ns, TimestampParseError};
