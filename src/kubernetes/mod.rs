// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for client creation, pod discovery and port-forwarding.

pub mod client;
pub mod pods;
pub mod portforward;

pub use client::create_client;
pub use pods::{find_backing_pod, BackingPod};
pub use portforward::PortForwardSession;
