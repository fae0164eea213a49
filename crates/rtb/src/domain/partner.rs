use crate::infra::client::Client;

/// Demand side partner taking part in the auction.
#[derive(Debug)]
pub struct Partner {
    name: Name,
    client: Client,
}

impl Partner {
    pub fn new(name: Name, client: Client) -> Self {
        Self { name, client }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name(pub String);

impl Name {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Name {
    fn from(inner: String) -> Self {
        Self(inner)
    }
}

impl From<&str> for Name {
    fn from(inner: &str) -> Self {
        Self(inner.to_owned())
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
