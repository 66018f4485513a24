pub mod support;

mod web;
