use crate::args::DeleteArgs;
use crate::commands::{open_store, Out};
use crate::error::{ErrorType, IntoResult};
use crate::store::Store;
use crate::{Config, Result};

/// Deletes one transaction by id.
pub async fn delete(config: Config, args: DeleteArgs) -> Result<Out<()>> {
    let store = open_store(&config).await?;
    store
        .delete_transaction(args.id())
        .await
        .pub_result(ErrorType::Store)?;
    Ok(format!("Deleted transaction {}", args.id()).into())
}
