//! Sparkify star schema: the `songplays` fact table and its four dimensions.

use sparkify_kernel::StatementSet;

pub const SONGPLAY_TABLE_DROP: &str = "DROP TABLE IF EXISTS songplays";
pub const USER_TABLE_DROP: &str = "DROP TABLE IF EXISTS users";
pub const SONG_TABLE_DROP: &str = "DROP TABLE IF EXISTS songs";
pub const ARTIST_TABLE_DROP: &str = "DROP TABLE IF EXISTS artists";
pub const TIME_TABLE_DROP: &str = "DROP TABLE IF EXISTS time";

pub const USER_TABLE_CREATE: &str = "CREATE TABLE IF NOT EXISTS users (
    user_id    INT PRIMARY KEY,
    first_name VARCHAR,
    last_name  VARCHAR,
    gender     CHAR(1),
    level      VARCHAR NOT NULL
)";

pub const ARTIST_TABLE_CREATE: &str = "CREATE TABLE IF NOT EXISTS artists (
    artist_id VARCHAR PRIMARY KEY,
    name      VARCHAR NOT NULL,
    location  VARCHAR,
    latitude  DOUBLE PRECISION,
    longitude DOUBLE PRECISION
)";

pub const SONG_TABLE_CREATE: &str = "CREATE TABLE IF NOT EXISTS songs (
    song_id   VARCHAR PRIMARY KEY,
    title     VARCHAR NOT NULL,
    artist_id VARCHAR REFERENCES artists (artist_id),
    year      INT,
    duration  NUMERIC NOT NULL
)";

pub const TIME_TABLE_CREATE: &str = "CREATE TABLE IF NOT EXISTS time (
    start_time TIMESTAMP PRIMARY KEY,
    hour       INT NOT NULL,
    day        INT NOT NULL,
    week       INT NOT NULL,
    month      INT NOT NULL,
    year       INT NOT NULL,
    weekday    INT NOT NULL
)";

pub const SONGPLAY_TABLE_CREATE: &str = "CREATE TABLE IF NOT EXISTS songplays (
    songplay_id SERIAL PRIMARY KEY,
    start_time  TIMESTAMP NOT NULL REFERENCES time (start_time),
    user_id     INT NOT NULL REFERENCES users (user_id),
    level       VARCHAR NOT NULL,
    song_id     VARCHAR REFERENCES songs (song_id),
    artist_id   VARCHAR REFERENCES artists (artist_id),
    session_id  INT NOT NULL,
    location    VARCHAR,
    user_agent  VARCHAR
)";

/// Referencing tables are dropped first.
pub const DROP_TABLE_QUERIES: &[&str] = &[
    SONGPLAY_TABLE_DROP,
    USER_TABLE_DROP,
    SONG_TABLE_DROP,
    ARTIST_TABLE_DROP,
    TIME_TABLE_DROP,
];

/// Referenced tables are created first.
pub const CREATE_TABLE_QUERIES: &[&str] = &[
    USER_TABLE_CREATE,
    ARTIST_TABLE_CREATE,
    SONG_TABLE_CREATE,
    TIME_TABLE_CREATE,
    SONGPLAY_TABLE_CREATE,
];

pub fn statement_set() -> StatementSet {
    StatementSet::new(
        DROP_TABLE_QUERIES.iter().copied(),
        CREATE_TABLE_QUERIES.iter().copied(),
    )
}
