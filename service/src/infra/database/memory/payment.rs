//! [`Payment`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use tracerr::Traced;

use crate::{
    domain::{payment, Payment},
    infra::{database, Database},
    read,
};

use super::{unique_violation, Memory, Record};

impl Record for Payment {
    type Id = payment::Id;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn ordered_by(&self) -> DateTime {
        self.date.coerce()
    }
}

impl Database<Select<By<Option<Payment>, payment::Id>>> for Memory {
    type Ok = Option<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Payment>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.state().await.payments.get(id).cloned())
    }
}

impl Database<Select<By<Vec<Payment>, read::payment::list::Filter>>>
    for Memory
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, read::payment::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::payment::list::Filter {
            tenant_id,
            landlord_id,
        } = by.into_inner();
        let state = self.state().await;
        Ok(state.payments.newest_first(|p| {
            tenant_id.map_or(true, |id| p.tenant_id == id)
                && landlord_id.map_or(true, |id| {
                    state
                        .properties
                        .get(p.property_id)
                        .is_some_and(|pr| pr.landlord_id == id)
                })
        }))
    }
}

impl Database<Insert<Payment>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(payment): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state().await;
        if state.payments.iter().any(|p| {
            p.id != payment.id && p.transaction_id == payment.transaction_id
        }) {
            return Err(unique_violation(database::constraint::PAYMENTS_TRANSACTION_ID));
        }
        state.payments.upsert(payment);
        Ok(())
    }
}
