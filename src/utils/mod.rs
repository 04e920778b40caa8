pub(crate) mod byte_cursor;
pub(crate) mod bytes;

pub(crate) use self::byte_cursor::ByteCursor;
