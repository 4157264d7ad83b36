//! End-to-end template builds against an in-memory chain.

use std::sync::Arc;

use flix_core::{sha3_hex, BuildContext, ChainReader, FlixError, InMemoryChain};
use flix_generator::{GeneratorConfig, GeneratorError, TemplateBuilder};
use flix_registry::ContractRegistry;
use flix_schema::{
    parse_template_str, to_json_pretty, verify_id, DependencyPin, FormatVersion, InteractionTemplate, TemplateView,
};
use flix_source::CadenceAnalyzer;

const HELLO_ADDRESS: &str = "0xe15193734357cf5c";

const GIVE_NUMBER: &str = "access(all) contract GiveNumber {\n    access(all) fun number(): Int {\n        return 42\n    }\n}\n";

const HELLO_WORLD: &str = "import GiveNumber from 0xe15193734357cf5c\n\naccess(all) contract HelloWorld {\n    access(all) fun greeting(): String {\n        return \"Hello, World!\"\n    }\n}\n";

const SAY_HELLO: &str = "import \"HelloWorld\"\n\naccess(all) fun main(): String {\n    return HelloWorld.greeting()\n}\n";

const UPDATE_GREETING: &str = r#"#interaction(
    version: "1.1.0",
    title: "Update Greeting",
    description: "Update the greeting on the HelloWorld contract",
    language: "en-US",
    parameters: [
        Parameter(name: "greeting", title: "Greeting", description: "The new greeting"),
    ],
)

import HelloWorld from 0xe15193734357cf5c

transaction(greeting: String, times: Int) {
    execute {
        HelloWorld.updateGreeting(newGreeting: greeting)
    }
}
"#;

const TRANSFER_V1: &str = r#"/**
    @f_version 1.0.0
    @lang en-US

    @message title: Transfer Tokens
    @message description: Transfer tokens from one account to another

    @parameter title amount: Amount
    @parameter description amount: The amount of FLOW tokens to send
    @parameter title to: To

    @balance amount: FlowToken
*/
import HelloWorld from 0xe15193734357cf5c

transaction(amount: UFix64, to: Address) {
    execute {}
}
"#;

fn chain() -> InMemoryChain {
    InMemoryChain::new("testnet", 100)
        .with_contract(HELLO_ADDRESS, "HelloWorld", HELLO_WORLD)
        .with_contract(HELLO_ADDRESS, "GiveNumber", GIVE_NUMBER)
}

fn config(format: FormatVersion) -> GeneratorConfig {
    let yaml = format!(
        "format: {}\nnetworks: [testnet]\ncontracts:\n  HelloWorld:\n    testnet: \"{}\"\n",
        match format {
            FormatVersion::V1 => "v1",
            FormatVersion::V2 => "v2",
        },
        HELLO_ADDRESS
    );
    GeneratorConfig::from_yaml(&yaml).unwrap()
}

fn builder(format: FormatVersion, chain: Arc<InMemoryChain>) -> TemplateBuilder {
    let reader: Arc<dyn ChainReader> = chain;
    TemplateBuilder::from_config(config(format)).with_reader("testnet", reader)
}

fn hello_pin(template: &InteractionTemplate) -> DependencyPin {
    template.dependencies()[0]
        .network("testnet")
        .and_then(|n| n.pin.clone())
        .and_then(|p| p.tree)
        .unwrap()
}

#[tokio::test]
async fn test_hello_world_golden_id() {
    let template = builder(FormatVersion::V2, Arc::new(chain()))
        .build(&BuildContext::new(), SAY_HELLO, None)
        .await
        .unwrap();

    assert_eq!(template.id(), "3132c8dd663834055fefa059dd1a2271da956eb53eddaf8c69ae0c4bc05e6fa5");

    let pins = template.network_pins();
    assert_eq!(pins.len(), 1);
    assert_eq!(
        pins[0].pin_self,
        "4cecab679edcd51c50f057a372b63340d20a2574782c652130c18f17c5a5a779"
    );
}

#[tokio::test]
async fn test_hello_world_pin_tree() {
    let chain = Arc::new(chain());
    let template = builder(FormatVersion::V2, chain.clone())
        .build(&BuildContext::new(), SAY_HELLO, None)
        .await
        .unwrap();

    let deps = template.dependencies();
    assert_eq!(deps.len(), 1);
    let testnet = deps[0].network("testnet").unwrap();
    assert_eq!(testnet.address, HELLO_ADDRESS);
    assert_eq!(testnet.pin.as_ref().unwrap().block_height, 100);

    let tree = hello_pin(&template);
    assert_eq!(tree.pin_self, sha3_hex(HELLO_WORLD));
    assert_eq!(tree.pin, "134e9beb159afc158f6d589dc6439b22ebe6061acbc2fe9290db0d2aeaf83638");
    assert_eq!(tree.imports.len(), 1);
    assert_eq!(tree.imports[0].pin_contract_name, "GiveNumber");
    assert_eq!(tree.imports[0].pin_self, sha3_hex(GIVE_NUMBER));
    assert!(tree.imports[0].imports.is_empty());
    assert_eq!(chain.total_fetches(), 2);

    let output = template.output().unwrap();
    assert_eq!((output.label.as_str(), output.type_name.as_str()), ("result", "String"));
}

#[tokio::test]
async fn test_builds_are_deterministic() {
    let first = builder(FormatVersion::V2, Arc::new(chain()))
        .build(&BuildContext::new(), UPDATE_GREETING, None)
        .await
        .unwrap();
    let second = builder(FormatVersion::V2, Arc::new(chain()))
        .build(&BuildContext::new(), UPDATE_GREETING, None)
        .await
        .unwrap();
    assert_eq!(first, second);
    assert!(verify_id(&first).unwrap());
}

#[tokio::test]
async fn test_zero_imports_make_no_chain_calls() {
    let chain = Arc::new(chain());
    let code = "access(all) fun main(a: Int, b: Int): Int {\n    return a + b\n}\n";
    let reader: Arc<dyn ChainReader> = chain.clone();
    let template = TemplateBuilder::from_config(GeneratorConfig::default())
        .with_reader("testnet", reader)
        .build(&BuildContext::new(), code, None)
        .await
        .unwrap();

    assert!(template.dependencies().is_empty());
    assert_eq!(chain.total_fetches(), 0);
    let pins = template.network_pins();
    let networks: Vec<_> = pins.iter().map(|p| p.network.as_str()).collect();
    assert_eq!(networks, vec!["mainnet", "testnet"]);
    assert!(pins.iter().all(|p| p.pin_self == sha3_hex(code)));
    assert_eq!(template.parameters().len(), 2);
}

#[tokio::test]
async fn test_missing_target_network_is_network_mismatch() {
    let mut config = config(FormatVersion::V2);
    config.networks = vec!["mainnet".to_string(), "testnet".to_string()];
    let reader: Arc<dyn ChainReader> = Arc::new(chain());
    let err = TemplateBuilder::from_config(config)
        .with_reader("testnet", reader)
        .build(&BuildContext::new(), SAY_HELLO, None)
        .await
        .unwrap_err();

    assert_eq!(
        err.as_flix(),
        Some(&FlixError::NetworkMismatch {
            contract: "HelloWorld".to_string(),
            network: "mainnet".to_string()
        })
    );
}

#[tokio::test]
async fn test_transitive_failure_yields_no_template() {
    let chain = Arc::new(chain().with_failure(HELLO_ADDRESS, "GiveNumber"));
    let err = builder(FormatVersion::V2, chain)
        .build(&BuildContext::new(), SAY_HELLO, None)
        .await
        .unwrap_err();
    assert!(matches!(err, GeneratorError::Build(FlixError::FetchFailure { .. })));
}

#[tokio::test]
async fn test_unknown_bare_import() {
    let err = builder(FormatVersion::V2, Arc::new(chain()))
        .build(&BuildContext::new(), "import \"Missing\"\naccess(all) fun main() {}", None)
        .await
        .unwrap_err();
    assert!(matches!(err.as_flix(), Some(FlixError::UnresolvedDependency { .. })));
}

#[tokio::test]
async fn test_pragma_metadata_and_bare_body() {
    let template = builder(FormatVersion::V2, Arc::new(chain()))
        .build(&BuildContext::new(), UPDATE_GREETING, None)
        .await
        .unwrap();

    assert!(template.is_mutating());
    assert!(template.raw_source().contains("import \"HelloWorld\"\n"));
    assert_eq!(flix_schema::messages::title(&template.messages(), ""), "Update Greeting");

    let params = template.parameters();
    assert_eq!(params.len(), 2);
    assert_eq!(flix_schema::messages::title(&params[0].messages, ""), "Greeting");
    assert!(params[1].messages.is_empty());
    assert!(template.output().is_none());
}

#[tokio::test]
async fn test_pragma_parameter_mismatch() {
    let code = UPDATE_GREETING.replace("name: \"greeting\"", "name: \"salutation\"");
    let err = builder(FormatVersion::V2, Arc::new(chain()))
        .build(&BuildContext::new(), &code, None)
        .await
        .unwrap_err();
    assert!(matches!(err.as_flix(), Some(FlixError::MalformedSource(_))));
}

#[tokio::test]
async fn test_prefill_seeds_messages() {
    let b = builder(FormatVersion::V2, Arc::new(chain()));
    let previous = b.build(&BuildContext::new(), UPDATE_GREETING, None).await.unwrap();

    let plain = "import \"HelloWorld\"\ntransaction(greeting: String) {}\n";
    let template = b.build(&BuildContext::new(), plain, Some(&previous)).await.unwrap();

    assert_eq!(template.messages(), previous.messages());
    assert_eq!(template.parameters()[0].messages, previous.parameters()[0].messages);
}

#[tokio::test]
async fn test_v1_build() {
    let template = builder(FormatVersion::V1, Arc::new(chain()))
        .build(&BuildContext::new(), SAY_HELLO, None)
        .await
        .unwrap();

    let InteractionTemplate::V1(doc) = &template else {
        panic!("expected a 1.0.0 document");
    };
    assert_eq!(doc.f_version, "1.0.0");
    assert!(doc.data.cadence.starts_with("import HelloWorld from 0xHELLOWORLDADDRESS\n"));
    let network = &doc.data.dependencies["0xHELLOWORLDADDRESS"]["HelloWorld"]["testnet"];
    assert_eq!(network.fq_address, "A.e15193734357cf5c.HelloWorld");
    assert_eq!(network.pin, "134e9beb159afc158f6d589dc6439b22ebe6061acbc2fe9290db0d2aeaf83638");
    assert_eq!(network.pin_block_height, 100);

    assert!(template.network_pins().is_empty());
    assert_eq!(template.output().unwrap().type_name, "AnyStruct");
    assert!(verify_id(&template).unwrap());
}

#[tokio::test]
async fn test_v1_build_reads_comment_block() {
    let template = builder(FormatVersion::V1, Arc::new(chain()))
        .build(&BuildContext::new(), TRANSFER_V1, None)
        .await
        .unwrap();

    let InteractionTemplate::V1(doc) = &template else {
        panic!("expected a 1.0.0 document");
    };
    let data = &doc.data;
    assert_eq!(data.messages.title.as_ref().unwrap().i18n["en-US"], "Transfer Tokens");
    assert_eq!(
        data.messages.description.as_ref().unwrap().i18n["en-US"],
        "Transfer tokens from one account to another"
    );

    let amount = &data.arguments["amount"];
    assert_eq!(amount.balance, "FlowToken");
    assert_eq!(amount.messages.title.as_ref().unwrap().i18n["en-US"], "Amount");
    assert_eq!(
        amount.messages.description.as_ref().unwrap().i18n["en-US"],
        "The amount of FLOW tokens to send"
    );
    let to = &data.arguments["to"];
    assert_eq!(to.balance, "");
    assert_eq!(to.messages.title.as_ref().unwrap().i18n["en-US"], "To");
    assert!(verify_id(&template).unwrap());

    // the 1.1.0 layout takes its metadata from the pragma only
    let v2 = builder(FormatVersion::V2, Arc::new(chain()))
        .build(&BuildContext::new(), TRANSFER_V1, None)
        .await
        .unwrap();
    assert!(v2.messages().is_empty());
    assert!(v2.parameters().iter().all(|p| p.balance.is_none() && p.messages.is_empty()));
}

#[tokio::test]
async fn test_built_template_round_trips() {
    for format in [FormatVersion::V1, FormatVersion::V2] {
        let template = builder(format, Arc::new(chain()))
            .build(&BuildContext::new(), UPDATE_GREETING, None)
            .await
            .unwrap();
        let parsed = parse_template_str(&to_json_pretty(&template).unwrap()).unwrap();
        assert_eq!(parsed, template);
    }
}

#[tokio::test]
async fn test_registry_pin_skips_chain() {
    let chain = Arc::new(chain());
    let first = builder(FormatVersion::V2, chain.clone())
        .build(&BuildContext::new(), SAY_HELLO, None)
        .await
        .unwrap();
    let tree = hello_pin(&first);

    let registry = ContractRegistry::core().with_pinned("HelloWorld", "testnet", HELLO_ADDRESS, 100, tree);
    let mut config = config(FormatVersion::V2);
    config.contracts.clear();
    let reader: Arc<dyn ChainReader> = chain.clone();
    let second = TemplateBuilder::new(config, Arc::new(registry), Arc::new(CadenceAnalyzer))
        .with_reader("testnet", reader)
        .build(&BuildContext::new(), SAY_HELLO, None)
        .await
        .unwrap();

    assert_eq!(second.id(), first.id());
    assert_eq!(chain.total_fetches(), 2);
}

#[tokio::test]
async fn test_explicit_core_import_uses_each_network_address() {
    const FLOW_MAINNET: &str = "0x1654653399040a61";
    const FLOW_TESTNET: &str = "0x7e60df042a9c0868";
    let flow_token = "access(all) contract FlowToken {}\n";
    let mainnet: Arc<dyn ChainReader> =
        Arc::new(InMemoryChain::new("mainnet", 7).with_contract(FLOW_MAINNET, "FlowToken", flow_token));
    let testnet: Arc<dyn ChainReader> =
        Arc::new(InMemoryChain::new("testnet", 9).with_contract(FLOW_TESTNET, "FlowToken", flow_token));
    let code = format!("import FlowToken from {}\ntransaction(amount: UFix64) {{}}\n", FLOW_TESTNET);

    let template = TemplateBuilder::from_config(GeneratorConfig::default())
        .with_reader("mainnet", mainnet)
        .with_reader("testnet", testnet)
        .build(&BuildContext::new(), &code, None)
        .await
        .unwrap();

    let flow = &template.dependencies()[0];
    assert_eq!(flow.network("emulator").unwrap().address, "0x0ae53cb6e3f42a79");
    assert_eq!(flow.network("mainnet").unwrap().address, FLOW_MAINNET);
    assert_eq!(flow.network("testnet").unwrap().address, FLOW_TESTNET);
    assert!(flow.network("emulator").unwrap().pin.is_none());

    let mainnet_pin = flow.network("mainnet").and_then(|n| n.pin.clone()).unwrap();
    assert_eq!(mainnet_pin.block_height, 7);
    assert_eq!(mainnet_pin.tree.unwrap().pin_contract_address, FLOW_MAINNET);

    let mainnet_source = format!("import FlowToken from {}\ntransaction(amount: UFix64) {{}}\n", FLOW_MAINNET);
    let pins = template.network_pins();
    let mainnet_network_pin = pins.iter().find(|p| p.network == "mainnet").unwrap();
    assert_eq!(mainnet_network_pin.pin_self, sha3_hex(mainnet_source));
}

#[tokio::test]
async fn test_sibling_imports_pinned_in_source_order() {
    let chain = Arc::new(chain().with_latency(std::time::Duration::from_millis(10)));
    let code = "import HelloWorld, GiveNumber from 0xe15193734357cf5c\naccess(all) fun main(): Int { return 1 }\n";
    let mut config = config(FormatVersion::V2);
    config.contracts.clear();
    let reader: Arc<dyn ChainReader> = chain.clone();
    let template = TemplateBuilder::from_config(config)
        .with_reader("testnet", reader)
        .build(&BuildContext::new(), code, None)
        .await
        .unwrap();

    let names: Vec<_> = template.dependencies().into_iter().map(|d| d.contract).collect();
    assert_eq!(names, vec!["HelloWorld", "GiveNumber"]);
    assert_eq!(hello_pin(&template).imports[0].pin_self, sha3_hex(GIVE_NUMBER));
    // GiveNumber is both a root and HelloWorld's child
    assert_eq!(chain.fetch_count(HELLO_ADDRESS, "GiveNumber"), 1);
}

#[tokio::test]
async fn test_cancelled_build() {
    let ctx = BuildContext::new();
    ctx.cancel();
    let err = builder(FormatVersion::V2, Arc::new(chain()))
        .build(&ctx, SAY_HELLO, None)
        .await
        .unwrap_err();
    assert_eq!(err.as_flix(), Some(&FlixError::Cancelled));
}

#[tokio::test]
async fn test_fixture_snapshot_matches_golden() {
    let chain = InMemoryChain::from_yaml(include_str!("../../../testing/fixtures/hello_world_chain.yaml")).unwrap();
    let config = GeneratorConfig::from_yaml(include_str!("../../../testing/fixtures/generator.yaml")).unwrap();
    assert_eq!(config.build_timeout_secs, Some(30));

    let reader: Arc<dyn ChainReader> = Arc::new(chain);
    let template = TemplateBuilder::from_config(config.clone())
        .with_reader("testnet", reader)
        .build(&config.context(), SAY_HELLO, None)
        .await
        .unwrap();
    assert_eq!(template.id(), "3132c8dd663834055fefa059dd1a2271da956eb53eddaf8c69ae0c4bc05e6fa5");
}
