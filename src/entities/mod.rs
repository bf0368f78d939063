pub mod cart;
pub mod cart_item;
pub mod coupon;
pub mod customer;
pub mod order;
pub mod order_item;
pub mod pending_cod_order;
pub mod product;
pub mod product_variant;
pub mod variant_size;

pub use cart::Entity as Cart;
pub use cart_item::Entity as CartItem;
pub use coupon::Entity as Coupon;
pub use customer::Entity as Customer;
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use pending_cod_order::Entity as PendingCodOrder;
pub use product::Entity as Product;
pub use product_variant::Entity as ProductVariant;
pub use variant_size::Entity as VariantSize;

pub use cart::Model as CartModel;
pub use cart_item::Model as CartItemModel;
pub use order::Model as OrderModel;
pub use order_item::Model as OrderItemModel;
