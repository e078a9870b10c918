#![allow(unused_crate_dependencies)]

mod stitching {
    mod abstract_types;
    mod basic;
    mod errors;
    mod fragments;
    mod links;
    mod mutations;
    mod remote;
    mod variables;
}
