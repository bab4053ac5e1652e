// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Decoding of workload manifests supplied for prediction.
//!
//! Input is a stream of YAML or JSON documents, separated by `---`.
//! `List` documents are flattened one level.

use crate::error::ManifestError;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod};
use kube::ResourceExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// A decoded manifest. Every kind the prediction pipeline does not know
/// about ends up as `Other`.
#[derive(Debug, Clone)]
pub enum Workload {
    Deployment(Deployment),
    StatefulSet(StatefulSet),
    Pod(Pod),
    DaemonSet(DaemonSet),
    PersistentVolumeClaim(PersistentVolumeClaim),
    Other { kind: String, name: String },
}

impl Workload {
    pub fn kind(&self) -> &str {
        match self {
            Workload::Deployment(_) => "Deployment",
            Workload::StatefulSet(_) => "StatefulSet",
            Workload::Pod(_) => "Pod",
            Workload::DaemonSet(_) => "DaemonSet",
            Workload::PersistentVolumeClaim(_) => "PersistentVolumeClaim",
            Workload::Other { kind, .. } => kind,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Workload::Deployment(o) => o.name_any(),
            Workload::StatefulSet(o) => o.name_any(),
            Workload::Pod(o) => o.name_any(),
            Workload::DaemonSet(o) => o.name_any(),
            Workload::PersistentVolumeClaim(o) => o.name_any(),
            Workload::Other { name, .. } => name.clone(),
        }
    }
}

/// Decode every workload in `input`, flattening lists
pub fn decode_workloads(input: &[u8]) -> Result<Vec<Workload>, ManifestError> {
    let mut workloads = Vec::new();

    for document in serde_yaml::Deserializer::from_slice(input) {
        let value = Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }

        if type_info(&value) == Some(("v1", "List")) {
            let items = match value {
                Value::Object(mut map) => map.remove("items"),
                _ => None,
            };
            for item in items.and_then(into_array).unwrap_or_default() {
                // Nested lists are not flattened any further
                match into_workload(item) {
                    Ok(workload) => workloads.push(workload),
                    Err(e) => warn!("decoding inside list: {}", e),
                }
            }
            continue;
        }

        match into_workload(value) {
            Ok(workload) => workloads.push(workload),
            Err(e) => {
                warn!("decoding: {}", e);
                break;
            }
        }
    }

    Ok(workloads)
}

fn into_array(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

fn type_info(value: &Value) -> Option<(&str, &str)> {
    let api_version = value.get("apiVersion")?.as_str()?;
    let kind = value.get("kind")?.as_str()?;
    Some((api_version, kind))
}

fn object_name(value: &Value) -> String {
    value
        .pointer("/metadata/name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn typed<K: DeserializeOwned>(value: Value, kind: &str) -> Result<K, ManifestError> {
    let name = object_name(&value);
    serde_json::from_value(value).map_err(|source| ManifestError::Typed {
        kind: kind.to_string(),
        name,
        source,
    })
}

fn into_workload(mut value: Value) -> Result<Workload, ManifestError> {
    let (api_version, kind) = type_info(&value).ok_or(ManifestError::MissingTypeInfo)?;
    let (api_version, kind) = (api_version.to_string(), kind.to_string());
    stringify_quantities(&mut value);

    let workload = match (api_version.as_str(), kind.as_str()) {
        ("apps/v1", "Deployment") => Workload::Deployment(typed(value, &kind)?),
        ("apps/v1", "StatefulSet") => Workload::StatefulSet(typed(value, &kind)?),
        ("apps/v1", "DaemonSet") => Workload::DaemonSet(typed(value, &kind)?),
        ("v1", "Pod") => Workload::Pod(typed(value, &kind)?),
        ("v1", "PersistentVolumeClaim") => Workload::PersistentVolumeClaim(typed(value, &kind)?),
        _ => Workload::Other {
            name: object_name(&value),
            kind,
        },
    };
    Ok(workload)
}

/// Quantities are strings in the API types, while hand-written manifests
/// often use bare numbers (`cpu: 1`). Convert those under requests/limits.
fn stringify_quantities(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if matches!(key.as_str(), "requests" | "limits") {
                    if let Value::Object(list) = child {
                        for quantity in list.values_mut() {
                            if let Value::Number(n) = quantity {
                                *quantity = Value::String(n.to_string());
                            }
                        }
                    }
                }
                stringify_quantities(child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(stringify_quantities),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPLOYMENT: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  replicas: 3
  selector:
    matchLabels: {app: web}
  template:
    metadata:
      labels: {app: web}
    spec:
      containers:
      - name: web
        image: nginx
        resources:
          requests:
            cpu: 1
            memory: 256Mi
"#;

    #[test]
    fn test_multi_document_stream() {
        let input = format!(
            "{}---\napiVersion: v1\nkind: Pod\nmetadata:\n  name: solo\nspec:\n  containers: []\n---\n",
            DEPLOYMENT
        );
        let workloads = decode_workloads(input.as_bytes()).unwrap();

        assert_eq!(workloads.len(), 2);
        assert_eq!(workloads[0].kind(), "Deployment");
        assert_eq!(workloads[0].name(), "web");
        assert_eq!(workloads[1].kind(), "Pod");
        assert_eq!(workloads[1].name(), "solo");
    }

    #[test]
    fn test_numeric_quantities_become_strings() {
        let workloads = decode_workloads(DEPLOYMENT.as_bytes()).unwrap();
        let Workload::Deployment(deployment) = &workloads[0] else {
            panic!("expected a deployment");
        };
        let requests = deployment.spec.as_ref().unwrap().template.spec.as_ref().unwrap().containers[0]
            .resources
            .as_ref()
            .unwrap()
            .requests
            .clone()
            .unwrap();
        assert_eq!(requests["cpu"].0, "1");
        assert_eq!(requests["memory"].0, "256Mi");
    }

    #[test]
    fn test_list_is_flattened() {
        let input = r#"{
            "apiVersion": "v1",
            "kind": "List",
            "items": [
                {"apiVersion": "v1", "kind": "PersistentVolumeClaim", "metadata": {"name": "data"}},
                {"kind": "Pod"},
                {"apiVersion": "apps/v1", "kind": "DaemonSet", "metadata": {"name": "agent"},
                 "spec": {"selector": {}, "template": {}}}
            ]
        }"#;
        let workloads = decode_workloads(input.as_bytes()).unwrap();

        let kinds: Vec<_> = workloads.iter().map(|w| w.kind().to_string()).collect();
        assert_eq!(kinds, vec!["PersistentVolumeClaim", "DaemonSet"]);
    }

    #[test]
    fn test_unknown_kinds_are_kept_as_other() {
        let input = "apiVersion: v1\nkind: Service\nmetadata:\n  name: frontend\n";
        let workloads = decode_workloads(input.as_bytes()).unwrap();

        assert!(matches!(
            &workloads[0],
            Workload::Other { kind, name } if kind == "Service" && name == "frontend"
        ));
    }

    #[test]
    fn test_untyped_document_stops_decoding() {
        let input = format!("metadata:\n  name: stray\n---\n{}", DEPLOYMENT);
        let workloads = decode_workloads(input.as_bytes()).unwrap();
        assert!(workloads.is_empty());
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        assert!(decode_workloads(b"kind: [unclosed").is_err());
    }
}
