use algolia_node::{AlgoliaClient, AlgoliaNode, Catalog, Config, recover_parameters};

#[tokio::main]
async fn main() {
    let node = AlgoliaNode::create(serde_json::from_str(include_str!("./node.json")).unwrap()).unwrap();

    let request = node.build().unwrap();
    println!("Request: {:#?}", request);

    let recovered = recover_parameters(Catalog::builtin().unwrap(), node.resource(), node.operation(), &request).unwrap();
    println!("Placed parameters: {:#?}", recovered);

    // only dispatch when real credentials are configured
    let config = Config::load_from_str(include_str!("./config.toml")).unwrap();
    if config.application_id == "YourApplicationID" {
        return;
    }

    match node.run(&AlgoliaClient::new(config)).await {
        Ok(output) => println!("Output: {:#?}", output),
        Err(err) => println!("Request failed: {}", err),
    }
}
