#![cfg(test)]

mod stubs;

mod orchestration {
    mod integration;
}
