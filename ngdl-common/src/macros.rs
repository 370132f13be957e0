/// Builds a `reqwest::Client` with the given user-agent sharing the given cookie jar.
///
/// Expects `Client` to be in scope at the call site.
#[macro_export]
macro_rules! client {
    ($ua:expr, $jar:expr) => {{
        Client::builder()
            .user_agent($ua)
            .cookie_provider($jar)
            .build()
    }};
}

/// Collects `name => value` pairs into a list of request headers.
#[macro_export]
macro_rules! headers {
    ($($name:expr => $value:expr),* $(,)?) => {{
        vec![$(($name, $value.to_string())),*]
    }};
}
