use geo::LineString;
use indexmap::IndexMap;
use itertools::Itertools;
use uom::si::f64::Length;
use uom::si::length::meter;

use super::{Edge, EdgeId, EdgeSpec, NetworkError, Vertex, VertexId};
use crate::util::geo::haversine;

/// a graph adjacency list with an entry (possibly empty) for each VertexId
/// in the Graph.
pub type DenseAdjacencyList = Box<[IndexMap<EdgeId, VertexId>]>;

/// Road network topology represented as an adjacency list. the `EdgeId` and
/// `VertexId` values correspond to edge and vertex indices in the `edges`
/// and `vertices` vectors.
///
/// the graph is read-only after construction; map matchers hold it behind an
/// `Arc` and may share it freely.
#[derive(Debug)]
pub struct Graph {
    pub vertices: Box<[Vertex]>,
    pub edges: Box<[Edge]>,
    pub adj: DenseAdjacencyList,
    pub rev: DenseAdjacencyList,
}

impl Graph {
    /// builds a graph from vertex records and edge descriptions. edge ids are
    /// assigned in insertion order; each edge's distance is measured along
    /// its polyline geometry (or the straight line between its endpoints).
    pub fn new(vertices: Vec<Vertex>, edge_specs: Vec<EdgeSpec>) -> Result<Self, NetworkError> {
        let mut adj: Vec<IndexMap<EdgeId, VertexId>> = vec![IndexMap::new(); vertices.len()];
        let mut rev: Vec<IndexMap<EdgeId, VertexId>> = vec![IndexMap::new(); vertices.len()];

        let mut edges: Vec<Edge> = Vec::with_capacity(edge_specs.len());
        for (idx, spec) in edge_specs.into_iter().enumerate() {
            let edge_id = EdgeId(idx);
            let src = vertices
                .get(spec.src_vertex_id.0)
                .ok_or(NetworkError::VertexNotFound(spec.src_vertex_id))?;
            let dst = vertices
                .get(spec.dst_vertex_id.0)
                .ok_or(NetworkError::VertexNotFound(spec.dst_vertex_id))?;

            let linestring = match &spec.geometry {
                Some(geometry) => geometry.clone(),
                None => straight_line(src, dst),
            };
            let distance_meters = linestring_length_meters(&linestring)
                .map_err(NetworkError::DatasetError)?;

            adj[spec.src_vertex_id.0].insert(edge_id, spec.dst_vertex_id);
            rev[spec.dst_vertex_id.0].insert(edge_id, spec.src_vertex_id);

            edges.push(Edge {
                edge_id,
                src_vertex_id: spec.src_vertex_id,
                dst_vertex_id: spec.dst_vertex_id,
                road_id: spec.road_id,
                distance: Length::new::<meter>(distance_meters),
                geometry: spec.geometry,
            });
        }

        Ok(Self {
            vertices: vertices.into_boxed_slice(),
            edges: edges.into_boxed_slice(),
            adj: adj.into_boxed_slice(),
            rev: rev.into_boxed_slice(),
        })
    }

    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn get_vertex(&self, vertex_id: &VertexId) -> Result<&Vertex, NetworkError> {
        self.vertices
            .get(vertex_id.0)
            .ok_or(NetworkError::VertexNotFound(*vertex_id))
    }

    pub fn get_edge(&self, edge_id: &EdgeId) -> Result<&Edge, NetworkError> {
        self.edges
            .get(edge_id.0)
            .ok_or(NetworkError::EdgeNotFound(*edge_id))
    }

    pub fn src_vertex_id(&self, edge_id: &EdgeId) -> Result<VertexId, NetworkError> {
        self.get_edge(edge_id).map(|e| e.src_vertex_id)
    }

    pub fn dst_vertex_id(&self, edge_id: &EdgeId) -> Result<VertexId, NetworkError> {
        self.get_edge(edge_id).map(|e| e.dst_vertex_id)
    }

    /// retrieve a list of `EdgeId`s for edges that depart from the given `VertexId`
    pub fn out_edges(&self, src: &VertexId) -> Vec<EdgeId> {
        self.out_edges_iter(src).cloned().collect_vec()
    }

    pub fn out_edges_iter<'a>(
        &'a self,
        src: &VertexId,
    ) -> Box<dyn Iterator<Item = &'a EdgeId> + 'a> {
        match self.adj.get(src.0) {
            Some(out_map) => Box::new(out_map.keys()),
            None => Box::new(std::iter::empty()),
        }
    }

    /// retrieve a list of `EdgeId`s for edges that arrive at the given `VertexId`
    pub fn in_edges(&self, dst: &VertexId) -> Vec<EdgeId> {
        self.in_edges_iter(dst).cloned().collect_vec()
    }

    pub fn in_edges_iter<'a>(
        &'a self,
        dst: &VertexId,
    ) -> Box<dyn Iterator<Item = &'a EdgeId> + 'a> {
        match self.rev.get(dst.0) {
            Some(in_map) => Box::new(in_map.keys()),
            None => Box::new(std::iter::empty()),
        }
    }

    /// the polyline geometry of an edge. edges without explicit geometry
    /// yield the straight line between their endpoint vertices.
    pub fn edge_linestring(&self, edge_id: &EdgeId) -> Result<LineString<f64>, NetworkError> {
        let edge = self.get_edge(edge_id)?;
        match &edge.geometry {
            Some(geometry) => Ok(geometry.clone()),
            None => {
                let src = self.get_vertex(&edge.src_vertex_id)?;
                let dst = self.get_vertex(&edge.dst_vertex_id)?;
                Ok(straight_line(src, dst))
            }
        }
    }

    /// the stable road identifier of an edge. edges missing road metadata
    /// synthesise one from their endpoint vertex ids as `"<u>-<v>"`.
    pub fn edge_road_id(&self, edge_id: &EdgeId) -> Result<String, NetworkError> {
        let edge = self.get_edge(edge_id)?;
        match &edge.road_id {
            Some(road_id) => Ok(road_id.clone()),
            None => Ok(format!("{}-{}", edge.src_vertex_id, edge.dst_vertex_id)),
        }
    }
}

fn straight_line(src: &Vertex, dst: &Vertex) -> LineString<f64> {
    LineString::new(vec![src.coordinate, dst.coordinate])
}

fn linestring_length_meters(linestring: &LineString<f64>) -> Result<f64, String> {
    let mut total = 0.0;
    for window in linestring.0.windows(2) {
        total += haversine::coord_distance_meters(window[0], window[1])?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn small_graph() -> Graph {
        // a straight south-to-north road split into three edges at lon 0
        let vertices = vec![
            Vertex::new(0, 0.0, 0.0),
            Vertex::new(1, 0.0, 0.001),
            Vertex::new(2, 0.0, 0.002),
            Vertex::new(3, 0.0, 0.003),
        ];
        let edges = vec![
            EdgeSpec::new(0, 1).with_road_id("road_A"),
            EdgeSpec::new(1, 2).with_road_id("road_B"),
            EdgeSpec::new(2, 3),
        ];
        Graph::new(vertices, edges).unwrap()
    }

    #[test]
    fn test_adjacency() {
        let graph = small_graph();
        assert_eq!(graph.n_vertices(), 4);
        assert_eq!(graph.n_edges(), 3);
        assert_eq!(graph.out_edges(&VertexId(1)), vec![EdgeId(1)]);
        assert_eq!(graph.in_edges(&VertexId(1)), vec![EdgeId(0)]);
        assert!(graph.out_edges(&VertexId(3)).is_empty());
    }

    #[test]
    fn test_distance_measured_from_endpoints() {
        let graph = small_graph();
        let edge = graph.get_edge(&EdgeId(0)).unwrap();
        // 0.001 degrees of latitude is roughly 111 m
        assert_relative_eq!(
            edge.distance.get::<meter>(),
            111.2,
            max_relative = 1e-2
        );
    }

    #[test]
    fn test_road_id_synthesised_when_missing() {
        let graph = small_graph();
        assert_eq!(graph.edge_road_id(&EdgeId(0)).unwrap(), "road_A");
        assert_eq!(graph.edge_road_id(&EdgeId(2)).unwrap(), "2-3");
    }

    #[test]
    fn test_missing_vertex_rejected() {
        let vertices = vec![Vertex::new(0, 0.0, 0.0)];
        let edges = vec![EdgeSpec::new(0, 7)];
        assert!(Graph::new(vertices, edges).is_err());
    }
}
