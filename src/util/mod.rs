pub(crate) mod regex_utils;
pub(crate) mod str_utils;
