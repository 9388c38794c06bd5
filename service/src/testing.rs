//! Fixtures for [`Service`] tests.

use common::{operations::Insert, DateTime, Money};

use crate::{
    domain::{
        application, lease, property, user, Address, Application, Lease,
        Property, User,
    },
    infra::{Database as _, Memory},
    Config, Service,
};

/// Password of every [`User`] created by [`insert_user()`].
pub(crate) const PASSWORD: &str = "correct horse";

/// Creates a new [`Service`] over an empty [`Memory`] database.
pub(crate) fn service() -> Service<Memory> {
    Service::without_tasks(Config::with_secret("test-secret"), Memory::new())
}

/// Parses the provided [`Money`] amount.
pub(crate) fn money(amount: &str) -> Money {
    amount.parse().unwrap()
}

/// Stores a new [`User`] with the provided [`user::Role`].
pub(crate) async fn insert_user(svc: &Service<Memory>, role: user::Role) -> User {
    let now = DateTime::now();
    let id = user::Id::new();
    let user = User {
        id,
        name: user::Name::new(format!("{role} {id}")).unwrap(),
        email: user::Email::new(format!("{id}@example.com")).unwrap(),
        password_hash: user::PasswordHash::new(
            &user::Password::new(PASSWORD).unwrap(),
        )
        .unwrap(),
        role,
        phone: None,
        profile_picture: None,
        address: None,
        created_at: now.coerce(),
        updated_at: now.coerce(),
        deleted_at: None,
    };
    svc.database().execute(Insert(user.clone())).await.unwrap();
    user
}

/// Returns a sample [`Address`].
pub(crate) fn address() -> Address {
    Address {
        street: "1 Main St".parse().unwrap(),
        city: "Springfield".parse().unwrap(),
        state: "IL".parse().unwrap(),
        zip_code: "62701".parse().unwrap(),
        country: "USA".parse().unwrap(),
    }
}

/// Stores a new available [`Property`] of the provided landlord.
pub(crate) async fn insert_property(
    svc: &Service<Memory>,
    landlord: &User,
) -> Property {
    let now = DateTime::now();
    let property = Property {
        id: property::Id::new(),
        name: property::Name::new("Sunny flat").unwrap(),
        address: address(),
        kind: property::Kind::Apartment,
        rent: money("1200"),
        bedrooms: property::Count::from(2_u32),
        bathrooms: property::Count::from(1_u32),
        square_footage: property::Count::from(850_u32),
        description: property::Description::new("Close to the park").unwrap(),
        amenities: vec![property::Amenity::Parking],
        images: vec![property::Image::placeholder()],
        status: property::Status::Available,
        landlord_id: landlord.id,
        current_tenant_id: None,
        created_at: now.coerce(),
        updated_at: now.coerce(),
    };
    svc.database()
        .execute(Insert(property.clone()))
        .await
        .unwrap();
    property
}

/// Stores a new [`Application`] of the provided tenant in the provided
/// [`application::Status`].
pub(crate) async fn insert_application(
    svc: &Service<Memory>,
    property: &Property,
    tenant: &User,
    status: application::Status,
) -> Application {
    let now = DateTime::now();
    let application = Application {
        id: application::Id::new(),
        property_id: property.id,
        tenant_id: tenant.id,
        employment_status: application::EmploymentStatus::FullTime,
        annual_income: money("60000"),
        current_address: "2 Elm St".parse().unwrap(),
        previous_landlord: previous_landlord(),
        reason_for_moving: "Closer to work".parse().unwrap(),
        additional_notes: None,
        status,
        created_at: now.coerce(),
        updated_at: now.coerce(),
    };
    svc.database()
        .execute(Insert(application.clone()))
        .await
        .unwrap();
    application
}

/// Returns a sample [`application::PreviousLandlord`].
pub(crate) fn previous_landlord() -> application::PreviousLandlord {
    application::PreviousLandlord {
        name: "John Smith".parse().unwrap(),
        phone: "555-0100".parse().unwrap(),
        email: "john.smith@example.com".parse().unwrap(),
    }
}

/// Stores a new [`Lease`] between the provided parties in the provided
/// [`lease::Status`].
pub(crate) async fn insert_lease(
    svc: &Service<Memory>,
    application: &Application,
    landlord: &User,
    status: lease::Status,
) -> Lease {
    let now = DateTime::now();
    let lease = Lease {
        id: lease::Id::new(),
        property_id: application.property_id,
        tenant_id: application.tenant_id,
        landlord_id: landlord.id,
        application_id: application.id,
        start_date: now.coerce(),
        end_date: now.add_days(365).coerce(),
        rent_amount: money("1200"),
        security_deposit: money("2400"),
        payment_due_day: lease::DueDay::new(1).unwrap(),
        terms: "No smoking".parse().unwrap(),
        status,
        tenant_signature: None,
        landlord_signature: None,
        advanced_payment: None,
        created_at: now.coerce(),
        updated_at: now.coerce(),
    };
    svc.database().execute(Insert(lease.clone())).await.unwrap();
    lease
}
