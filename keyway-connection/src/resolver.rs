//! Authentication flow resolution
//!
//! Finds the shortest chain of credential builders leading from the
//! credentials an identity already holds to a credential some connection
//! builder accepts for the target connection specification.
//!
//! The search runs over a directed graph:
//!
//! - the start node is the identity, the end node is the connection
//! - the start node points at one node per credential type the identity
//!   holds, plus one node for [`CredentialType::ANY`] so that builders
//!   accepting any input can start a chain
//! - every credential builder registered for the target configuration type
//!   contributes an edge from its input type to its output type, and an
//!   edge from the identity-held node of its input type to its output type
//! - every connection builder registered for the target specification type
//!   contributes an edge from its credential type to the end node
//!
//! Identity-held nodes are distinct from credential-type nodes, so holding a
//! credential never reaches the end node on its own through the graph. That
//! case is handled by an explicit short-circuit before the search.

use crate::builders::{ConnectionBuilder, CredentialBuilder};
use crate::error::{ConnectionError, Result};
use crate::identity::Identity;
use crate::types::{AuthenticationConfigurationType, ConnectionSpecificationType, CredentialType};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Outcome of a successful resolution
#[derive(Clone)]
pub struct ResolvedFlow {
    /// Credential type taken from the identity, or [`CredentialType::ANY`]
    pub source_credential_type: CredentialType,
    /// Credential type handed to the connection builder
    pub target_credential_type: CredentialType,
    /// Builders to run, in order
    pub credential_builders: Vec<Arc<dyn CredentialBuilder>>,
}

impl ResolvedFlow {
    /// Whether the identity's own credential is used as is
    pub fn is_short_circuit(&self) -> bool {
        self.credential_builders.is_empty()
    }
}

impl fmt::Debug for ResolvedFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedFlow")
            .field("source_credential_type", &self.source_credential_type)
            .field("target_credential_type", &self.target_credential_type)
            .field(
                "credential_builders",
                &self
                    .credential_builders
                    .iter()
                    .map(|builder| builder.key().to_string())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FlowNode {
    Identity,
    Held(CredentialType),
    Type(CredentialType),
    Connection,
}

impl FlowNode {
    fn credential_type(&self) -> Option<&CredentialType> {
        match self {
            FlowNode::Held(credential_type) | FlowNode::Type(credential_type) => {
                Some(credential_type)
            }
            FlowNode::Identity | FlowNode::Connection => None,
        }
    }
}

struct FlowGraph {
    edges: HashMap<FlowNode, Vec<FlowNode>>,
    builders: HashMap<(CredentialType, CredentialType), Arc<dyn CredentialBuilder>>,
}

impl FlowGraph {
    fn new() -> Self {
        Self {
            edges: HashMap::new(),
            builders: HashMap::new(),
        }
    }

    /// Adjacency lists keep insertion order, which drives BFS tie-breaking
    fn add_edge(&mut self, from: FlowNode, to: FlowNode) {
        let adjacent = self.edges.entry(from).or_default();
        if !adjacent.contains(&to) {
            adjacent.push(to);
        }
    }

    fn adjacent(&self, node: &FlowNode) -> &[FlowNode] {
        self.edges.get(node).map(Vec::as_slice).unwrap_or_default()
    }

    /// Breadth-first search from the identity to the connection. Nodes are
    /// marked when first discovered, so the first-registered edge wins ties.
    fn shortest_path(&self) -> Option<Vec<FlowNode>> {
        let mut discovered: HashSet<FlowNode> = HashSet::from([FlowNode::Identity]);
        let mut previous: HashMap<FlowNode, FlowNode> = HashMap::new();
        let mut queue: VecDeque<FlowNode> = VecDeque::from([FlowNode::Identity]);

        while let Some(node) = queue.pop_front() {
            for adjacent in self.adjacent(&node) {
                if !discovered.insert(adjacent.clone()) {
                    continue;
                }
                previous.insert(adjacent.clone(), node.clone());
                if *adjacent == FlowNode::Connection {
                    return Some(Self::trace_back(&previous));
                }
                queue.push_back(adjacent.clone());
            }
        }
        None
    }

    /// Nodes strictly between the identity and the connection, in order
    fn trace_back(previous: &HashMap<FlowNode, FlowNode>) -> Vec<FlowNode> {
        let mut path = vec![];
        let mut current = previous.get(&FlowNode::Connection);
        while let Some(node) = current {
            if *node == FlowNode::Identity {
                break;
            }
            path.push(node.clone());
            current = previous.get(node);
        }
        path.reverse();
        path
    }

    fn into_flow(self, path: Vec<FlowNode>) -> Result<ResolvedFlow> {
        if path.len() < 2 {
            return Err(ConnectionError::invalid_flow_state("invalid flow state found!"));
        }
        let credential_types = path
            .iter()
            .map(|node| {
                node.credential_type().cloned().ok_or_else(|| {
                    ConnectionError::invalid_flow_state(format!(
                        "unexpected node in flow: {node:?}"
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let credential_builders = credential_types
            .windows(2)
            .map(|pair| {
                self.builders
                    .get(&(pair[0].clone(), pair[1].clone()))
                    .cloned()
                    .ok_or_else(|| {
                        ConnectionError::invalid_flow_state(format!(
                            "Can't find a matching credential builder (input: {}, output: {})",
                            pair[0], pair[1]
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ResolvedFlow {
            source_credential_type: credential_types[0].clone(),
            target_credential_type: credential_types[credential_types.len() - 1].clone(),
            credential_builders,
        })
    }
}

/// Resolver over a fixed set of registered builders
pub struct AuthenticationFlowResolver<'a> {
    credential_builders: &'a [Arc<dyn CredentialBuilder>],
    connection_builders: &'a [Arc<dyn ConnectionBuilder>],
}

impl<'a> AuthenticationFlowResolver<'a> {
    /// Builders are explored in the order given here
    pub fn new(
        credential_builders: &'a [Arc<dyn CredentialBuilder>],
        connection_builders: &'a [Arc<dyn ConnectionBuilder>],
    ) -> Self {
        Self {
            credential_builders,
            connection_builders,
        }
    }

    /// Resolve a flow for `identity`
    ///
    /// Returns `Ok(None)` when no chain reaches a connection builder for
    /// `specification_type`. An error means the graph was inconsistent.
    pub fn resolve(
        &self,
        identity: &Identity,
        configuration_type: &AuthenticationConfigurationType,
        specification_type: &ConnectionSpecificationType,
    ) -> Result<Option<ResolvedFlow>> {
        if let Some(flow) = self.short_circuit(identity, specification_type) {
            debug!(
                source = %flow.source_credential_type,
                "Identity credential accepted directly by a connection builder"
            );
            return Ok(Some(flow));
        }

        let graph = self.build_graph(identity, configuration_type, specification_type);
        let Some(path) = graph.shortest_path() else {
            debug!("No authentication flow found");
            return Ok(None);
        };
        let flow = graph.into_flow(path)?;
        debug!(
            source = %flow.source_credential_type,
            target = %flow.target_credential_type,
            steps = flow.credential_builders.len(),
            "Resolved authentication flow"
        );
        Ok(Some(flow))
    }

    fn short_circuit(
        &self,
        identity: &Identity,
        specification_type: &ConnectionSpecificationType,
    ) -> Option<ResolvedFlow> {
        let accepted: Vec<CredentialType> = self
            .connection_builders
            .iter()
            .filter(|builder| builder.connection_specification_type() == *specification_type)
            .map(|builder| builder.credential_type())
            .collect();

        identity
            .credential_types()
            .into_iter()
            .find(|credential_type| accepted.contains(credential_type))
            .map(|credential_type| ResolvedFlow {
                source_credential_type: credential_type.clone(),
                target_credential_type: credential_type,
                credential_builders: vec![],
            })
    }

    fn build_graph(
        &self,
        identity: &Identity,
        configuration_type: &AuthenticationConfigurationType,
        specification_type: &ConnectionSpecificationType,
    ) -> FlowGraph {
        let mut graph = FlowGraph::new();

        for credential_type in identity.credential_types() {
            graph.add_edge(FlowNode::Identity, FlowNode::Held(credential_type));
        }
        graph.add_edge(FlowNode::Identity, FlowNode::Held(CredentialType::ANY));

        for builder in self
            .credential_builders
            .iter()
            .filter(|builder| builder.authentication_configuration_type() == *configuration_type)
        {
            let input = builder.input_credential_type();
            let output = builder.output_credential_type();
            if input != output {
                graph.add_edge(FlowNode::Type(input.clone()), FlowNode::Type(output.clone()));
            }
            graph.add_edge(FlowNode::Held(input.clone()), FlowNode::Type(output.clone()));
            graph
                .builders
                .entry((input, output))
                .or_insert_with(|| Arc::clone(builder));
        }

        for builder in self
            .connection_builders
            .iter()
            .filter(|builder| builder.connection_specification_type() == *specification_type)
        {
            graph.add_edge(FlowNode::Type(builder.credential_type()), FlowNode::Connection);
        }

        graph
    }
}
