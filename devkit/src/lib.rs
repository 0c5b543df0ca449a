/*!
# Sensor DevKit - Stubs et utilitaires de test

Bibliothèque facilitant les tests du runtime jsonapi-sensor avec:
- Endpoint JSON simulé (wiremock) dont la réponse change entre deux polls
- Renderers scriptés (échec, sortie fixe, enregistrement du contexte)
- Harness qui assemble endpoint + capteur et expose des assertions
*/

pub mod renderers;
pub mod stub_endpoint;
pub mod test_utils;

pub use renderers::{FailingRenderer, RecordingRenderer, StaticRenderer};
pub use stub_endpoint::StubEndpoint;
pub use test_utils::TestHarness;
