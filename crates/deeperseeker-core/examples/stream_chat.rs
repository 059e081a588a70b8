use std::io::Write as _;
use std::sync::Arc;

use deeperseeker_core::observability::init_observability;
use deeperseeker_core::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ChatError> {
    init_observability()?;

    let prompt = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let prompt = if prompt.trim().is_empty() {
        "Stream a short greeting.".to_string()
    } else {
        prompt
    };

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let client = ChatClient::builder()
        .config(ClientConfig::from_env()?)
        .credentials(Arc::new(EnvOrStoreCredential::new(store.clone())))
        .build()?;

    let mut conversation = Conversation::new(client, ModelId::load_selected(store.as_ref()));
    let (_, summary) = conversation
        .send(prompt, |fragment| {
            print!("{}", fragment.text);
            let _ = std::io::stdout().flush();
        })
        .await?;
    println!();
    eprintln!(
        "fragments={} done_sentinel={} malformed={}",
        summary.fragments, summary.saw_done, summary.malformed_frames
    );
    Ok(())
}
