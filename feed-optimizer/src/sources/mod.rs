pub mod fixture_feed;

pub use fixture_feed::{ActionRecord, FeedFixture, FixtureItem, FixtureProbe, FixtureRenderer};
