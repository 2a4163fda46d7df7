//! Hand-written models matching `fixtures/declarations.json`, with the validators the
//! build script generated for them compiled in next to each model.

pub mod support {
    include!(concat!(env!("OUT_DIR"), "/support.rs"));
}

#[allow(non_snake_case)]
pub mod models {
    use std::collections::HashMap;

    #[derive(Debug, Clone, Default)]
    pub struct User {
        pub FirstName: String,
        pub LastName: String,
        pub Age: u8,
    }

    #[derive(Debug, Clone, Default)]
    pub struct Account {
        pub UserName: String,
    }

    #[derive(Debug, Clone, Default)]
    pub struct Pair {
        pub Field1: String,
        pub Field2: String,
    }

    #[derive(Debug, Clone, Default)]
    pub struct Profile {
        pub nick: Option<String>,
        pub contact: Option<String>,
        pub tags: Vec<String>,
        pub ip: [u8; 4],
        pub scores: HashMap<String, u32>,
        pub role: String,
        pub ratio: f32,
        pub low: i32,
        pub high: i64,
        pub title: String,
    }

    include!(concat!(env!("OUT_DIR"), "/models_validators.rs"));
}

pub mod people {
    #[derive(Debug, Clone, Default)]
    pub struct Customer {
        pub name: String,
        pub email: String,
    }

    include!(concat!(env!("OUT_DIR"), "/people_validators.rs"));
}

pub mod orders {
    #[derive(Debug, Clone, Default)]
    pub struct Order {
        pub id: u64,
        pub customer: crate::people::Customer,
        pub backup: Option<crate::people::Customer>,
    }

    include!(concat!(env!("OUT_DIR"), "/orders_validators.rs"));
}
