//! Tests for the authentication coordinator
