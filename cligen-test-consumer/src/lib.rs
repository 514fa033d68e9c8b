//! The CLI generated from `people.yaml`, compiled against hand-written
//! payload types.

include!(concat!(env!("OUT_DIR"), "/cli.rs"));

pub mod people {
    use serde::Serialize;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct CreatePayload {
        pub name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub score: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub address: Option<Address>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct Address {
        pub street: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub zip: Option<i64>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct ShowPayload {
        pub id: u32,
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct ResizePayload {
        pub w: i64,
        pub h: i64,
    }

    pub mod client {
        include!(concat!(env!("OUT_DIR"), "/people/client/cli.rs"));
    }
}

impl cli::Request {
    /// JSON form of the payload, `null` for endpoints without one.
    pub fn payload_json(&self) -> serde_json::Value {
        let value = match self {
            cli::Request::PeopleCreate(p) => serde_json::to_value(p),
            cli::Request::PeopleShow(p) => serde_json::to_value(p),
            cli::Request::PeopleResize(p) => serde_json::to_value(p),
            cli::Request::PeopleList => Ok(serde_json::Value::Null),
        };
        value.unwrap_or_default()
    }
}
