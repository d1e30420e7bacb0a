pub mod text_utils;
pub mod time_utils;
pub mod serde_utils;

pub fn i32_to_bool(value: i32) -> bool {
  value != 0
}

pub fn bool_to_i32(value: bool) -> i32 {
  match value {
    true => 1,
    false => 0
  }
}
