//! End-to-end forward passes over a small academic graph.

use std::collections::HashMap;

use candle_core::{Device, Tensor};
use hetero_gat::{
    Aggregation, EdgeIndexDict, EdgeType, FeatureDict, HeteroGatConfig, HeteroGatConv, NodeType,
};

fn device() -> Device {
    Device::Cpu
}

fn features(n: usize, width: usize, scale: f32) -> Tensor {
    let data: Vec<f32> = (0..n * width).map(|i| ((i % 13) as f32 - 6.0) * scale).collect();
    Tensor::from_vec(data, (n, width), &device()).unwrap()
}

fn edge_index(src: &[i64], dst: &[i64]) -> Tensor {
    let mut data = src.to_vec();
    data.extend_from_slice(dst);
    Tensor::from_vec(data, (2, src.len()), &device()).unwrap()
}

/// author -writes-> paper, paper -cites-> paper, paper -published_in-> venue.
fn academic_config() -> HeteroGatConfig {
    let mut in_channels = HashMap::new();
    in_channels.insert(NodeType::from("author"), 16usize);
    in_channels.insert(NodeType::from("paper"), 8usize);
    in_channels.insert(NodeType::from("venue"), 4usize);

    let mut config = HeteroGatConfig::new(
        in_channels,
        4,
        vec!["author".into(), "paper".into(), "venue".into()],
        vec![
            EdgeType::new("author", "writes", "paper"),
            EdgeType::new("paper", "cites", "paper"),
            EdgeType::new("paper", "published_in", "venue"),
        ],
    );
    config.heads = 2;
    config
}

fn academic_inputs() -> (FeatureDict, EdgeIndexDict) {
    // 4 authors, 5 papers, 2 venues.
    let mut x_dict = FeatureDict::new();
    x_dict.insert("author".into(), features(4, 16, 0.05));
    x_dict.insert("paper".into(), features(5, 8, 0.1));
    x_dict.insert("venue".into(), features(2, 4, 0.2));

    let mut edges = EdgeIndexDict::new();
    edges.insert(
        EdgeType::new("author", "writes", "paper"),
        edge_index(&[0, 0, 1, 2, 3, 3], &[0, 1, 1, 2, 3, 4]),
    );
    edges.insert(
        EdgeType::new("paper", "cites", "paper"),
        edge_index(&[1, 2, 3, 4, 4], &[0, 0, 1, 1, 2]),
    );
    edges.insert(
        EdgeType::new("paper", "published_in", "venue"),
        edge_index(&[0, 1, 2, 3, 4], &[0, 0, 1, 1, 1]),
    );
    (x_dict, edges)
}

#[test]
fn forward_covers_destination_types_only() {
    let layer = HeteroGatConv::new(academic_config(), &device()).unwrap();
    let (x_dict, edges) = academic_inputs();
    let out = layer.forward(&x_dict, &edges).unwrap();

    // "author" is never a destination: no output entry for it.
    assert_eq!(out.len(), 2);
    assert!(!out.contains_key(&NodeType::from("author")));
    assert_eq!(out[&NodeType::from("paper")].dims(), &[5, 8]);
    assert_eq!(out[&NodeType::from("venue")].dims(), &[2, 8]);
}

#[test]
fn paper_layout_spans_three_relations() {
    let layer = HeteroGatConv::new(academic_config(), &device()).unwrap();
    // paper: source of cites + published_in, destination of writes; the
    // same-type cites relation takes one slot, not two.
    assert_eq!(layer.layout().num_relations(&"paper".into()), 3);
    assert_eq!(
        layer.lin_weight(&"paper".into()).unwrap().dims(),
        &[3 * 2 * 4, 8]
    );
}

#[test]
fn outputs_are_finite_and_deterministic() {
    let mut layer = HeteroGatConv::new(academic_config(), &device()).unwrap();
    layer.reset_parameters(Some(17)).unwrap();
    let (x_dict, edges) = academic_inputs();

    let first = layer.forward(&x_dict, &edges).unwrap();
    let second = layer.forward(&x_dict, &edges).unwrap();
    for ntype in [NodeType::from("paper"), NodeType::from("venue")] {
        let a = first[&ntype].to_vec2::<f32>().unwrap();
        let b = second[&ntype].to_vec2::<f32>().unwrap();
        assert_eq!(a, b);
        assert!(a.iter().flatten().all(|v| v.is_finite()));
    }
}

#[test]
fn aggregation_modes_differ_with_multiple_relations_per_destination() {
    // Two relations land on "b": sum and max must disagree for generic
    // parameters, and both keep the output shape.
    let mut config = HeteroGatConfig::new(
        8,
        4,
        vec!["a".into(), "b".into()],
        vec![EdgeType::new("a", "r1", "b"), EdgeType::new("b", "r2", "b")],
    );
    config.heads = 1;

    let mut x_dict = FeatureDict::new();
    x_dict.insert("a".into(), features(3, 8, 0.3));
    x_dict.insert("b".into(), features(4, 8, 0.7));
    let mut edges = EdgeIndexDict::new();
    edges.insert(
        EdgeType::new("a", "r1", "b"),
        edge_index(&[0, 1, 2], &[0, 1, 2]),
    );
    edges.insert(
        EdgeType::new("b", "r2", "b"),
        edge_index(&[3, 0, 1], &[0, 1, 2]),
    );

    let mut sum_layer = HeteroGatConv::new(config.clone(), &device()).unwrap();
    config.aggr = Aggregation::Max;
    let mut max_layer = HeteroGatConv::new(config, &device()).unwrap();
    sum_layer.reset_parameters(Some(21)).unwrap();
    max_layer.reset_parameters(Some(21)).unwrap();

    let out_sum = sum_layer.forward(&x_dict, &edges).unwrap();
    let out_max = max_layer.forward(&x_dict, &edges).unwrap();
    let b = NodeType::from("b");
    assert_eq!(out_sum[&b].dims(), &[4, 4]);
    assert_eq!(out_max[&b].dims(), &[4, 4]);
    assert_ne!(
        out_sum[&b].to_vec2::<f32>().unwrap(),
        out_max[&b].to_vec2::<f32>().unwrap()
    );
}

#[test]
fn forward_with_partial_edge_dict() {
    let layer = HeteroGatConv::new(academic_config(), &device()).unwrap();
    let (x_dict, mut edges) = academic_inputs();
    edges.remove(&EdgeType::new("paper", "published_in", "venue"));
    let out = layer.forward(&x_dict, &edges).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[&NodeType::from("paper")].dims(), &[5, 8]);
}
