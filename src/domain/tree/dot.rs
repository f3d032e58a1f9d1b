use std::fmt;

use petgraph::{
    dot::Dot,
    graph::{Graph, NodeIndex},
};

use super::node::{Color, Link, Node};
use crate::domain::DomainKey;

struct Vertex<'a> {
    key: &'a DomainKey,
    color: Color,
}

impl fmt::Display for Vertex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.key.fmt(f)
    }
}

pub fn render<V>(root: &Link<V>) -> String {
    let mut graph = Graph::new();
    if let Some(root) = root {
        add(&mut graph, root);
    }

    let dot = Dot::with_attr_getters(
        &graph,
        &[],
        &|_, _| String::new(),
        &|_, (_, vertex)| match vertex.color {
            Color::Red => "color = red".to_string(),
            Color::Black => "color = black".to_string(),
        },
    );
    format!("{dot}")
}

fn add<'a, V>(graph: &mut Graph<Vertex<'a>, &'static str>, node: &'a Node<V>) -> NodeIndex {
    let index = graph.add_node(Vertex {
        key: &node.key,
        color: node.color,
    });
    for (child, side) in [(&node.left, "L"), (&node.right, "R")] {
        if let Some(child) = child {
            let child = add(graph, child);
            graph.add_edge(index, child, side);
        }
    }
    index
}
