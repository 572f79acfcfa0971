use redb::TableDefinition;

/// File records: file id -> FileRecord (msgpack)
pub const FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("files");

/// Owner index: ownerId\0fileId -> projected KeyMap (msgpack)
pub const OWNER_INDEX: TableDefinition<&str, &[u8]> = TableDefinition::new("owner-index");

/// Time index: ownerId\0creationDate\0fileId -> projected KeyMap (msgpack)
pub const TIME_INDEX: TableDefinition<&str, &[u8]> = TableDefinition::new("time-index");

/// Name index: ownerId\0fileName\0fileId -> projected KeyMap (msgpack)
pub const NAME_INDEX: TableDefinition<&str, &[u8]> = TableDefinition::new("name-index");
