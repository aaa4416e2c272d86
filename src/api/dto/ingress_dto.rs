use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct IngressListQuery {
    pub namespace: Option<String>,
}
